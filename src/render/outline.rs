//! Rebuild the nested outline of each command tree from its decoded events.
//!
//! Events are grouped by sequence. A depth-0 `command_output` closes a tree
//! and prints it immediately; trees still open when the input ends (truncated
//! logs, crashed runs) are printed afterwards in first-seen order.
//!
//! Output shape for one tree:
//! Parent (9f2c..):
//!   input:
//!     x: 1
//!   Child:
//!     input:
//!       y: 2
//!   output:
//!     z: 3
//! output:
//!   w: 4

use crate::log::{EventKind, TraceEvent, TraceReader};
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::io::{BufRead, Write};

pub struct TraceTreePrinter<W> {
    dest: W,
    /// Sequences in the order they were first seen.
    order: Vec<String>,
    pending: HashMap<String, Vec<TraceEvent>>,
}

impl<W: Write> TraceTreePrinter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            dest,
            order: Vec::new(),
            pending: HashMap::new(),
        }
    }

    pub fn push(&mut self, event: TraceEvent) -> Result<()> {
        let closes = event.is_root() && event.is_kind(EventKind::CommandOutput);
        let sequence = event.sequence.clone();

        if !self.pending.contains_key(&sequence) {
            self.order.push(sequence.clone());
        }
        let buffer = self.pending.entry(sequence.clone()).or_default();
        buffer.push(event);

        if closes {
            let events = self.pending.remove(&sequence).unwrap_or_default();
            self.order.retain(|s| s != &sequence);
            self.write_tree(&events)?;
        }
        Ok(())
    }

    /// Print every tree that never closed and hand back the destination.
    pub fn finish(mut self) -> Result<W> {
        let order = std::mem::take(&mut self.order);
        for sequence in order {
            if let Some(events) = self.pending.remove(&sequence) {
                tracing::debug!(%sequence, events = events.len(), "printing incomplete trace");
                self.write_tree(&events)?;
            }
        }
        self.dest.flush().context("flush outline")?;
        Ok(self.dest)
    }

    fn write_tree(&mut self, events: &[TraceEvent]) -> Result<()> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }

    fn write_event(&mut self, event: &TraceEvent) -> Result<()> {
        let depth = event.depth;
        match event.kind {
            EventKind::CommandInput => {
                let header = if event.is_root() {
                    format!("{} ({}):", event.cmd, event.sequence)
                } else {
                    format!("{}:", event.cmd)
                };
                self.line(depth, &header)?;
                self.line(depth + 1, "input:")?;
                self.message(depth + 2, event)
            }
            EventKind::CommandOutput => {
                self.line(depth, "output:")?;
                self.message(depth + 1, event)
            }
            EventKind::Info | EventKind::Debug | EventKind::Error => {
                self.message(depth + 1, event)
            }
        }
    }

    fn message(&mut self, depth: usize, event: &TraceEvent) -> Result<()> {
        let Some(msg) = &event.msg else {
            return Ok(());
        };
        for text in msg.lines() {
            self.line(depth, &text)?;
        }
        Ok(())
    }

    fn line(&mut self, depth: usize, text: &str) -> Result<()> {
        let pad = depth * 2;
        writeln!(self.dest, "{:pad$}{}", "", text).context("write outline")?;
        Ok(())
    }
}

/// Decode `reader` to the end and print every tree it contains into `dest`.
pub fn pretty_print<R: BufRead, W: Write>(reader: TraceReader<R>, dest: W) -> Result<W> {
    let mut printer = TraceTreePrinter::new(dest);
    for event in reader {
        printer.push(event?)?;
    }
    printer.finish()
}
