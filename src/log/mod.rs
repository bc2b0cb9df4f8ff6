//! Structured trace events and the decoder that recovers them from a log stream.

pub mod event;
pub mod parse;

pub use event::{EventKind, Message, SlotKey, TraceEvent};
pub use parse::TraceReader;
