//! Correlated tracing for trees of nested commands.
//!
//! - `result`: the per-tree `HierarchicalResult` (nested output scopes plus
//!   event emission) and the sinks it writes lines to.
//! - `log`: the event model and `TraceReader`, which recovers events from an
//!   arbitrary, interleaved log stream.
//! - `render`: `TraceTreePrinter`, which regroups events by sequence and
//!   prints each tree as an indented outline.
//! - `command`: dispatch glue that drives a result around nested commands.

pub mod command;
pub mod demo;
pub mod log;
pub mod logging;
pub mod render;
pub mod result;

pub type Result<T> = anyhow::Result<T>;

pub use log::{EventKind, Message, SlotKey, TraceEvent, TraceReader};
pub use render::{TraceTreePrinter, pretty_print};
pub use result::{HierarchicalResult, LogFormat, LogSink, TraceConfig};
