//! Static description of a command's inputs and outputs.
//!
//! Each input carries an explicit setter, so binding parameters to a command
//! is a walk over the declared list rather than a lookup by name.

use crate::command::error::CommandError;
use crate::command::Params;
use anyhow::anyhow;
use serde_json::Value;

/// Copies one parameter value into the command.
pub type Setter<C> = fn(&mut C, &Value) -> anyhow::Result<()>;

pub struct InputSpec<C> {
    pub name: &'static str,
    pub desc: &'static str,
    pub optional: bool,
    assign: Setter<C>,
}

#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub name: &'static str,
    pub desc: &'static str,
    pub optional: bool,
}

pub struct IoSchema<C> {
    command: &'static str,
    desc: &'static str,
    inputs: Vec<InputSpec<C>>,
    outputs: Vec<OutputSpec>,
}

impl<C> IoSchema<C> {
    pub fn new(command: &'static str, desc: &'static str) -> Self {
        Self {
            command,
            desc,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, name: &'static str, desc: &'static str, assign: Setter<C>) -> Self {
        self.inputs.push(InputSpec {
            name,
            desc,
            optional: false,
            assign,
        });
        self
    }

    pub fn optional_input(
        mut self,
        name: &'static str,
        desc: &'static str,
        assign: Setter<C>,
    ) -> Self {
        self.inputs.push(InputSpec {
            name,
            desc,
            optional: true,
            assign,
        });
        self
    }

    pub fn output(mut self, name: &'static str, desc: &'static str) -> Self {
        self.outputs.push(OutputSpec {
            name,
            desc,
            optional: false,
        });
        self
    }

    pub fn optional_output(mut self, name: &'static str, desc: &'static str) -> Self {
        self.outputs.push(OutputSpec {
            name,
            desc,
            optional: true,
        });
        self
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn description(&self) -> &'static str {
        self.desc
    }

    pub fn inputs(&self) -> &[InputSpec<C>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    /// Every required input must carry a value.
    pub fn validate_input(&self, params: &Params) -> Result<(), CommandError> {
        for input in self.inputs.iter().filter(|i| !i.optional) {
            if is_missing(params.get(input.name)) {
                return Err(CommandError::MissingInput {
                    command: self.command,
                    input: input.name,
                });
            }
        }
        Ok(())
    }

    /// Run the setter of every declared input present in `params`.
    pub fn assign(&self, dest: &mut C, params: &Params) -> Result<(), CommandError> {
        for input in &self.inputs {
            let Some(value) = params.get(input.name) else {
                continue;
            };
            (input.assign)(dest, value).map_err(|err| CommandError::InvalidInput {
                command: self.command,
                input: input.name,
                reason: format!("{:#}", err),
            })?;
        }
        Ok(())
    }

    /// Every required output must have been written to `outputs`.
    pub fn validate_output(&self, outputs: &serde_json::Map<String, Value>) -> Result<(), CommandError> {
        for output in self.outputs.iter().filter(|o| !o.optional) {
            if !outputs.contains_key(output.name) {
                return Err(CommandError::MissingOutput {
                    command: self.command,
                    output: output.name,
                });
            }
        }
        Ok(())
    }

    /// A task invoked with `help` as its first input asks for usage instead.
    pub fn is_help(&self, params: &Params) -> bool {
        self.inputs
            .first()
            .and_then(|i| params.get(i.name))
            .and_then(Value::as_str)
            == Some("help")
    }

    pub fn help_text(&self) -> String {
        let mut out = format!("{}: {}\n", self.command, self.desc);
        out.push_str("  Input:\n");
        for i in &self.inputs {
            out.push_str(&param_line(i.name, i.desc, i.optional));
        }
        out.push_str("  Output:\n");
        for o in &self.outputs {
            out.push_str(&param_line(o.name, o.desc, o.optional));
        }
        out
    }
}

fn param_line(name: &str, desc: &str, optional: bool) -> String {
    let suffix = if optional { " (optional)" } else { "" };
    format!("    {}: {}{}\n", name, desc, suffix)
}

/// Absent, null, empty and `*` all count as "not given".
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() || s == "*",
        Some(_) => false,
    }
}

pub fn as_string(value: &Value) -> anyhow::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(anyhow!("expected a string, got {}", other)),
    }
}

pub fn as_string_list(value: &Value) -> anyhow::Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("expected a list, got {}", value))?;
    items.iter().map(as_string).collect()
}

pub fn as_u64(value: &Value) -> anyhow::Result<u64> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| anyhow!("expected an unsigned integer, got {}", n)),
        Value::String(s) => Ok(s.trim().parse()?),
        other => Err(anyhow!("expected an unsigned integer, got {}", other)),
    }
}
