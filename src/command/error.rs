use thiserror::Error;

/// Contract errors raised by the dispatcher. A command that merely fails
/// reports that through `HierarchicalResult::failed`, not through this type.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command {0} is not registered")]
    Unregistered(&'static str),

    #[error("{command}: you must specify the required input {input}")]
    MissingInput {
        command: &'static str,
        input: &'static str,
    },

    #[error("{command}: missing required value {output} in output")]
    MissingOutput {
        command: &'static str,
        output: &'static str,
    },

    #[error("{command}: invalid value for input {input}: {reason}")]
    InvalidInput {
        command: &'static str,
        input: &'static str,
        reason: String,
    },
}
