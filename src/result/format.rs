//! Line formats for emitted trace events.

use crate::log::{EventKind, TraceEvent};
use serde::{Deserialize, Serialize};

/// How each event is turned into a log line.
///
/// `Json` lines can be decoded again by `TraceReader`; `Human` lines are an
/// indented console rendering and do not round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Human,
}

/// Trace settings applied to every result a dispatcher creates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// `None` when there is nothing to write (a human-format info/debug/error
/// event without a message).
pub fn format_event(event: &TraceEvent, format: LogFormat) -> Option<String> {
    match format {
        LogFormat::Json => match serde_json::to_string(event) {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::warn!(%err, cmd = %event.cmd, "cannot serialize trace event");
                None
            }
        },
        LogFormat::Human => format_human(event),
    }
}

fn format_human(event: &TraceEvent) -> Option<String> {
    let base = 2 * event.depth;
    let extra = base + 2;
    let msg = event.msg.as_ref().map(|m| m.compact());

    match event.kind {
        EventKind::CommandInput => Some(format!(
            "{:base$}{}: {}",
            "",
            event.cmd,
            msg.unwrap_or_default()
        )),
        EventKind::CommandOutput => Some(format!(
            "{:extra$}output: {}",
            "",
            msg.unwrap_or_default()
        )),
        _ => msg.map(|m| format!("{:extra$}{}", "", m)),
    }
}
