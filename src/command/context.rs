use crate::command::dispatch::Dispatcher;
use crate::command::error::CommandError;
use crate::command::{Command, Params};
use crate::log::SlotKey;
use crate::result::HierarchicalResult;
use serde::{Deserialize, Serialize};

/// Who started the root of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootContext {
    /// Test harness; inputs and outputs are validated against the schema.
    Test,
    /// Task runner; a `help` first input prints usage instead of running.
    Task,
    Api,
}

/// Where a running command sits in its tree.
pub struct Invocation<'d> {
    dispatcher: &'d Dispatcher,
    root: RootContext,
    command: &'static str,
    parent: Option<&'static str>,
    depth: usize,
}

impl<'d> Invocation<'d> {
    pub(crate) fn root(dispatcher: &'d Dispatcher, root: RootContext, command: &'static str) -> Self {
        Self {
            dispatcher,
            root,
            command,
            parent: None,
            depth: 0,
        }
    }

    pub fn root_context(&self) -> RootContext {
        self.root
    }

    pub fn is_test_context(&self) -> bool {
        self.root == RootContext::Test
    }

    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    /// Call depth, counting keyless children too.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `check` only when the tree was started by the test harness.
    pub fn testing(&self, check: impl FnOnce()) {
        if self.is_test_context() {
            check();
        }
    }

    /// Run `C` as a child of the current command. With a key, its outputs go
    /// into the sub-scope at that key; without one they merge into the
    /// caller's scope.
    ///
    /// A keyless child also shares the caller's trace frame, so its events
    /// carry the caller's depth and command name. Its depth-0 output closes
    /// the printed outline early; the rest of the tree prints as a second
    /// block under the same sequence.
    pub fn execute_child<C: Command>(
        &self,
        result: &mut HierarchicalResult,
        key: Option<SlotKey>,
        params: Params,
    ) -> Result<(), CommandError> {
        let child = Invocation {
            dispatcher: self.dispatcher,
            root: self.root,
            command: C::NAME,
            parent: Some(self.command),
            depth: self.depth + 1,
        };

        result.push(key.as_ref(), C::NAME);
        let outcome = self.dispatcher.create_and_execute::<C>(&child, params, result);
        result.pop(key.as_ref());
        outcome
    }
}
