//! Small commands used by the `demo` subcommand and the tests.

use crate::command::io::{as_string, as_string_list};
use crate::command::{Command, CommandError, Invocation, IoSchema, Registry, params};
use crate::result::HierarchicalResult;
use serde_json::json;

pub const INFO_STRING: &str = "my info";
pub const DEBUG_STRING: &str = "my debug";
pub const TEST_OUTPUT: &str = "SOME_TEST_OUTPUT";
pub const FAILURE_MESSAGE: &str = "This command failed";
pub const CUSTOM_RESULT_CODE: i32 = 10;

/// Registry holding every demo command.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register::<HelloWorld>()
        .register::<GreetGroup>()
        .register::<ParentWithLogging>()
        .register::<Failing>()
        .register::<FailWithCode>();
    registry
}

#[derive(Debug, Default)]
pub struct HelloWorld {
    name: String,
}

impl Command for HelloWorld {
    const NAME: &'static str = "HelloWorld";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Say hello to someone")
            .input("name", "Name of person to say hello to", |c: &mut Self, v| {
                c.name = as_string(v)?;
                Ok(())
            })
            .output("greeting", "Greeting for the person")
            .optional_output("context_test", "True when run by the test harness")
            .optional_output("context_child", "True when run by another command")
    }

    fn execute_internal(
        &mut self,
        ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        let greeting = format!("Hello {}", self.name);
        result.info(greeting.as_str());
        result.set_output("greeting", greeting);
        result.set_output("context_test", ctx.is_test_context());
        result.set_output("context_child", ctx.is_child());
        Ok(())
    }
}

/// Greets every name through a `HelloWorld` child, one slot per index.
#[derive(Debug, Default)]
pub struct GreetGroup {
    names: Vec<String>,
}

impl Command for GreetGroup {
    const NAME: &'static str = "GreetGroup";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Say hello to a group").input(
            "names",
            "Array of names to greet",
            |c: &mut Self, v| {
                c.names = as_string_list(v)?;
                Ok(())
            },
        )
    }

    fn execute_internal(
        &mut self,
        ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        for (i, name) in self.names.iter().enumerate() {
            ctx.execute_child::<HelloWorld>(result, Some(i.into()), params(json!({ "name": name })))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ParentWithLogging {
    test_in: String,
}

impl Command for ParentWithLogging {
    const NAME: &'static str = "ParentWithLogging";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Command that does some logging")
            .input("test_in", "Some test input", |c: &mut Self, v| {
                c.test_in = as_string(v)?;
                Ok(())
            })
            .output("test_out", "Some test output")
    }

    fn execute_internal(
        &mut self,
        ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        result.info(INFO_STRING);
        result.debug_with(|| format!("{} ({})", DEBUG_STRING, self.test_in));
        ctx.execute_child::<HelloWorld>(result, Some(1usize.into()), params(json!({ "name": "Chris" })))?;
        result.set_output("test_out", TEST_OUTPUT);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Failing;

impl Command for Failing {
    const NAME: &'static str = "Failing";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Command with an internal failure")
    }

    fn execute_internal(
        &mut self,
        _ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        result.failed(FAILURE_MESSAGE);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FailWithCode;

impl Command for FailWithCode {
    const NAME: &'static str = "FailWithCode";

    fn describe_io() -> IoSchema<Self> {
        IoSchema::new(Self::NAME, "Command that fails with a custom result code")
    }

    fn execute_internal(
        &mut self,
        _ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError> {
        result.failed_with_code(FAILURE_MESSAGE, CUSTOM_RESULT_CODE);
        Ok(())
    }
}
