//! Result of a tree of commands: nested output scopes, outcome, and the
//! correlated trace every command in the tree emits through it.
//!
//! One `HierarchicalResult` is owned by one root execution and handed down
//! to every nested command, so a command only ever talks to the result,
//! never to its ancestors. It is single-writer state: the dispatcher runs
//! children one at a time on the thread that owns the tree.

pub mod format;
pub mod scope;
pub mod sink;

pub use format::{LogFormat, TraceConfig, format_event};
pub use scope::{Frame, ScopeStack};
pub use sink::{LogSink, MemorySink, Severity, WriterSink};

use crate::log::{EventKind, Message, SlotKey, TraceEvent};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const RESULT_CODE_OK: i32 = 0;
pub const RESULT_CODE_FAILED: i32 = 1;

/// Parameter keys owned by the dispatch framework; never logged.
pub const INTERNAL_KEYS: [&str; 3] = ["logger", "test", "parent"];

pub fn is_internal_key(key: &str) -> bool {
    INTERNAL_KEYS.contains(&key)
}

#[derive(Debug, Clone)]
struct ExecFrame {
    key: Option<SlotKey>,
    cmd: String,
}

struct Tracer {
    sequence: String,
    format: LogFormat,
    sink: Arc<dyn LogSink>,
    frames: Vec<ExecFrame>,
}

pub struct HierarchicalResult {
    result_code: i32,
    last_error: Option<String>,
    scopes: ScopeStack,
    tracer: Option<Tracer>,
}

impl Default for HierarchicalResult {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HierarchicalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalResult")
            .field("result_code", &self.result_code)
            .field("last_error", &self.last_error)
            .field("sequence", &self.sequence())
            .field("outputs", self.scopes.root())
            .finish()
    }
}

impl HierarchicalResult {
    /// A new ok result with one empty scope and tracing disabled.
    pub fn new() -> Self {
        Self {
            result_code: RESULT_CODE_OK,
            last_error: None,
            scopes: ScopeStack::new(),
            tracer: None,
        }
    }

    /// Enable tracing: every emission becomes one line on `sink`, tagged
    /// with `sequence`.
    pub fn configure_logger(&mut self, sink: Arc<dyn LogSink>, format: LogFormat, sequence: String) {
        self.tracer = Some(Tracer {
            sequence,
            format,
            sink,
            frames: Vec::new(),
        });
    }

    pub fn is_logging(&self) -> bool {
        self.tracer.is_some()
    }

    /// Correlation id of this tree, if tracing is enabled.
    pub fn sequence(&self) -> Option<&str> {
        self.tracer.as_ref().map(|t| t.sequence.as_str())
    }

    /// Seed the execution frames with the root command so its events are
    /// emitted at depth 0.
    pub fn root_command(&mut self, cmd: &str) {
        if let Some(tracer) = &mut self.tracer {
            tracer.frames.push(ExecFrame {
                key: None,
                cmd: cmd.to_string(),
            });
        }
    }

    /// Route outputs into the sub-scope at `key` until the matching `pop`.
    /// Without a key the nested command writes straight into the current
    /// scope and its events stay at the caller's depth.
    pub fn push(&mut self, key: Option<&SlotKey>, cmd: &str) {
        let Some(key) = key else {
            return;
        };
        self.scopes.push(key.to_string());
        if let Some(tracer) = &mut self.tracer {
            tracer.frames.push(ExecFrame {
                key: Some(key.clone()),
                cmd: cmd.to_string(),
            });
        }
    }

    pub fn pop(&mut self, key: Option<&SlotKey>) {
        let Some(key) = key else {
            return;
        };
        self.scopes.pop(&key.to_string());
        if let Some(tracer) = &mut self.tracer {
            tracer.frames.pop();
        }
    }

    /// Current write target.
    pub fn current(&self) -> &Frame {
        self.scopes.current()
    }

    /// Root output scope.
    pub fn outputs(&self) -> &Frame {
        self.scopes.root()
    }

    pub fn into_outputs(self) -> Frame {
        self.scopes.into_root()
    }

    pub fn set_output(&mut self, key: impl Into<SlotKey>, value: impl Into<Value>) {
        self.scopes
            .current_mut()
            .insert(key.into().to_string(), value.into());
    }

    pub fn get_output(&self, key: impl Into<SlotKey>) -> Option<&Value> {
        self.scopes.current().get(&key.into().to_string())
    }

    pub fn has_output(&self, key: impl Into<SlotKey>) -> bool {
        self.scopes.current().contains_key(&key.into().to_string())
    }

    pub fn info(&self, msg: impl Into<Message>) {
        self.info_with(|| msg);
    }

    /// Like `info`, but `msg` is only built when tracing is enabled.
    pub fn info_with<M: Into<Message>>(&self, msg: impl FnOnce() -> M) {
        if self.tracer.is_some() {
            self.emit(EventKind::Info, Some(msg().into()), Severity::Info);
        }
    }

    pub fn debug(&self, msg: impl Into<Message>) {
        self.debug_with(|| msg);
    }

    pub fn debug_with<M: Into<Message>>(&self, msg: impl FnOnce() -> M) {
        if self.tracer.is_some() {
            self.emit(EventKind::Debug, Some(msg().into()), Severity::Info);
        }
    }

    pub fn error(&self, msg: impl Into<Message>) {
        if self.tracer.is_some() {
            self.emit(EventKind::Error, Some(msg.into()), Severity::Error);
        }
    }

    /// Mark the tree failed with `RESULT_CODE_FAILED`.
    pub fn failed(&mut self, msg: impl Into<String>) {
        self.failed_with_code(msg, RESULT_CODE_FAILED);
    }

    pub fn failed_with_code(&mut self, msg: impl Into<String>, code: i32) {
        let msg = msg.into();
        self.result_code = code;
        self.error(msg.as_str());
        self.last_error = Some(msg);
    }

    /// True until a `failed*` call anywhere in the tree.
    pub fn is_ok(&self) -> bool {
        self.result_code == RESULT_CODE_OK
    }

    pub fn result_code(&self) -> i32 {
        self.result_code
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Emit the caller-supplied parameters of the command being entered.
    pub fn log_input(&self, params: &Map<String, Value>) {
        if self.tracer.is_none() {
            return;
        }
        let input: Map<String, Value> = params
            .iter()
            .filter(|(k, _)| !is_internal_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.emit(EventKind::CommandInput, Some(Message::Fields(input)), Severity::Info);
    }

    /// Emit the first-level outputs of the current scope. Nested maps belong
    /// to child scopes, which log their own output.
    pub fn log_output(&self) {
        if self.tracer.is_none() {
            return;
        }
        let output: Map<String, Value> = self
            .current()
            .iter()
            .filter(|(k, v)| !v.is_object() && !is_internal_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.emit(EventKind::CommandOutput, Some(Message::Fields(output)), Severity::Info);
    }

    fn emit(&self, kind: EventKind, msg: Option<Message>, severity: Severity) {
        let Some(tracer) = &self.tracer else {
            return;
        };
        let Some(frame) = tracer.frames.last() else {
            tracing::warn!(kind = %kind, "trace emitted before the root command was recorded");
            return;
        };

        let event = TraceEvent {
            sequence: tracer.sequence.clone(),
            cmd: frame.cmd.clone(),
            depth: tracer.frames.len() - 1,
            key: frame.key.clone(),
            kind,
            msg,
            line: String::new(),
        };

        let Some(line) = format_event(&event, tracer.format) else {
            return;
        };
        match severity {
            Severity::Info => tracer.sink.info(&line),
            Severity::Error => tracer.sink.error(&line),
        }
    }
}
