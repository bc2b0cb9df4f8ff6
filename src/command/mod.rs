//! Dispatch glue around `HierarchicalResult`: commands, their declared
//! inputs and outputs, and the executor that nests them.
//!
//! Per command the dispatcher does, in order:
//! 1) push the child's slot key (children only)
//! 2) log the input parameters
//! 3) validate (test context) and bind the inputs
//! 4) run the command
//! 5) validate the outputs (test context) and log them
//! 6) pop the slot key
//!
//! One result is shared by the whole tree, so a failure at any depth makes
//! the whole tree not-ok; the last `failed*` call decides code and message.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod registry;
pub mod transaction;

pub use context::{Invocation, RootContext};
pub use dispatch::{Dispatcher, TaskOutcome, new_sequence};
pub use error::CommandError;
pub use io::{IoSchema, OutputSpec, Setter};
pub use registry::Registry;
pub use transaction::{TransactionStore, execute_in_transaction};

use crate::result::HierarchicalResult;
use serde_json::{Map, Value};

/// Parameters handed to a command, by input name.
pub type Params = Map<String, Value>;

pub trait Command: Default + 'static {
    /// Name used in trace events.
    const NAME: &'static str;

    fn describe_io() -> IoSchema<Self>;

    fn execute_internal(
        &mut self,
        ctx: &Invocation<'_>,
        result: &mut HierarchicalResult,
    ) -> Result<(), CommandError>;
}

/// Build a `Params` map from a JSON object literal; anything else is empty.
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
