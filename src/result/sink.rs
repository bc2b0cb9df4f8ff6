//! Destinations for emitted trace lines.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// Anything that accepts finished log lines.
///
/// Shared by every root execution that writes to it, so a line must be
/// written in one piece; lines from different roots may interleave freely.
pub trait LogSink: Send + Sync {
    fn info(&self, line: &str);
    fn error(&self, line: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Logger-style sink over any writer:
/// I, [2024-05-06T10:00:00.000000+02:00 #4242]  INFO -- : <line>
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_line(&self, severity: Severity, line: &str) {
        let label = severity.label();
        let stamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z");
        let mut w = lock(&self.writer);
        let written = writeln!(
            w,
            "{}, [{} #{}] {:>5} -- : {}",
            &label[..1],
            stamp,
            std::process::id(),
            label,
            line
        )
        .and_then(|_| w.flush());
        if let Err(err) = written {
            tracing::warn!(%err, "failed to write trace line");
        }
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn info(&self, line: &str) {
        self.write_line(Severity::Info, line);
    }

    fn error(&self, line: &str) {
        self.write_line(Severity::Error, line);
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Severity, String)> {
        lock(&self.lines).clone()
    }

    pub fn info_lines(&self) -> Vec<String> {
        self.by_severity(Severity::Info)
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.by_severity(Severity::Error)
    }

    pub fn last_info(&self) -> Option<String> {
        self.info_lines().pop()
    }

    pub fn last_error(&self) -> Option<String> {
        self.error_lines().pop()
    }

    /// Everything recorded so far as logger-style text, one line per entry,
    /// ready to be fed back through a `TraceReader`.
    pub fn to_log_text(&self) -> String {
        lock(&self.lines)
            .iter()
            .map(|(severity, line)| format!("{:>5} -- : {}\n", severity.label(), line))
            .collect()
    }

    fn by_severity(&self, severity: Severity) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn info(&self, line: &str) {
        lock(&self.lines).push((Severity::Info, line.to_string()));
    }

    fn error(&self, line: &str) {
        lock(&self.lines).push((Severity::Error, line.to_string()));
    }
}
