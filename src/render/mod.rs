//! Rendering of decoded traces.

pub mod outline;

pub use outline::{TraceTreePrinter, pretty_print};
