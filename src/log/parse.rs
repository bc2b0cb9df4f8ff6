use crate::log::event::TraceEvent;
use crate::Result;
use anyhow::Context;
use regex::Regex;
use std::io::BufRead;

/// Marker preceding the JSON payload in a logger-style line, e.g.
/// I, [2024-05-06T10:00:00.000000 #4242]  INFO -- : {"sequence":"..",...}
const PAYLOAD_RE: &str = r#"--\s+:\s+(\{.*\})"#;

/// Pulls trace events out of an arbitrary text stream.
///
/// Lines without the marker, payloads that are not valid JSON and payloads
/// missing a required field are skipped. With a sequence filter, events that
/// belong to other root executions are skipped as well.
pub struct TraceReader<R> {
    stream: R,
    sequence: Option<String>,
    re: Regex,
    buf: Vec<u8>,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(stream: R, sequence: Option<String>) -> Result<Self> {
        Ok(Self {
            stream,
            sequence,
            re: Regex::new(PAYLOAD_RE)?,
            buf: Vec::new(),
        })
    }

    /// True once the underlying stream has nothing left to read.
    pub fn at_end(&mut self) -> Result<bool> {
        let buf = self.stream.fill_buf().context("read trace stream")?;
        Ok(buf.is_empty())
    }

    /// Scan forward to the next matching event. `Ok(None)` at end of stream.
    pub fn next_event(&mut self) -> Result<Option<TraceEvent>> {
        loop {
            self.buf.clear();
            let n = self
                .stream
                .read_until(b'\n', &mut self.buf)
                .context("read trace stream")?;
            if n == 0 {
                return Ok(None);
            }

            let text = String::from_utf8_lossy(&self.buf);
            let line = text.trim_end_matches(['\r', '\n']);

            let Some(payload) = self.re.captures(line).and_then(|caps| caps.get(1)) else {
                continue;
            };

            let mut event: TraceEvent = match serde_json::from_str(payload.as_str()) {
                Ok(event) => event,
                Err(err) => {
                    tracing::debug!(%err, line, "skipping malformed trace payload");
                    continue;
                }
            };

            if self
                .sequence
                .as_deref()
                .is_some_and(|want| want != event.sequence)
            {
                continue;
            }

            event.line = line.to_string();
            return Ok(Some(event));
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::event::{EventKind, Message, SlotKey};
    use std::io::Cursor;

    fn line(seq: &str, depth: usize, cmd: &str, kind: &str, msg: &str) -> String {
        format!(
            "I, [2024-05-06T10:00:00.000000 #1]  INFO -- : {{\"sequence\":\"{}\",\"cmd\":\"{}\",\"depth\":{},\"kind\":\"{}\",\"msg\":{}}}\n",
            seq, cmd, depth, kind, msg
        )
    }

    #[test]
    fn filters_noise_and_other_sequences() {
        let mut text = String::new();
        text.push_str("Started GET /users\n");
        text.push_str(&line("A", 0, "Parent", "command_input", r#"{"x":1}"#));
        text.push_str(&line("B", 0, "Other", "command_input", r#"{}"#));
        text.push_str("random -- : not json at all\n");
        text.push_str(&line("A", 1, "Child", "info", r#""hello""#));
        text.push_str(&line("B", 0, "Other", "command_output", r#"{}"#));
        text.push_str(&line("A", 0, "Parent", "command_output", r#"{"w":4}"#));

        let reader = TraceReader::new(Cursor::new(text), Some("A".to_string())).unwrap();
        let events: Vec<TraceEvent> = reader.collect::<Result<_>>().unwrap();

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.sequence == "A"));
        assert!(events[0].is_kind(EventKind::CommandInput));
        assert_eq!(events[1].msg, Some(Message::Text("hello".into())));
        assert!(events[2].is_root() && events[2].is_kind(EventKind::CommandOutput));
    }

    #[test]
    fn unfiltered_reader_yields_every_sequence() {
        let text = format!(
            "{}{}",
            line("A", 0, "Parent", "info", r#""a""#),
            line("B", 0, "Other", "info", r#""b""#)
        );
        let reader = TraceReader::new(Cursor::new(text), None).unwrap();
        let seqs: Vec<String> = reader.map(|e| e.unwrap().sequence).collect();
        assert_eq!(seqs, vec!["A", "B"]);
    }

    #[test]
    fn payload_missing_required_fields_is_noise() {
        let text = "INFO -- : {\"sequence\":\"A\",\"cmd\":\"X\"}\n\
                    INFO -- : {\"sequence\":\"A\",\"cmd\":\"X\",\"depth\":0,\"kind\":\"bogus\"}\n";
        let mut reader = TraceReader::new(Cursor::new(text), None).unwrap();
        assert!(reader.next_event().unwrap().is_none());
        assert!(reader.at_end().unwrap());
    }

    #[test]
    fn keeps_source_line_and_tolerates_missing_newline() {
        let text = "INFO -- : {\"sequence\":\"A\",\"cmd\":\"X\",\"depth\":0,\"kind\":\"debug\"}";
        let mut reader = TraceReader::new(Cursor::new(text), None).unwrap();
        assert!(!reader.at_end().unwrap());
        let event = reader.next_event().unwrap().unwrap();
        assert_eq!(event.line, text);
        assert_eq!(event.msg, None);
        assert!(reader.at_end().unwrap());
    }

    #[test]
    fn unusual_slot_keys_do_not_drop_events() {
        let text = "INFO -- : {\"sequence\":\"A\",\"cmd\":\"X\",\"depth\":1,\"key\":-1,\"kind\":\"info\"}\n\
                    INFO -- : {\"sequence\":\"A\",\"cmd\":\"X\",\"depth\":1,\"key\":1.5,\"kind\":\"info\"}\n";
        let reader = TraceReader::new(Cursor::new(text), None).unwrap();
        let keys: Vec<Option<SlotKey>> = reader.map(|e| e.unwrap().key).collect();
        assert_eq!(
            keys,
            vec![Some(SlotKey::Name("-1".into())), Some(SlotKey::Name("1.5".into()))]
        );
    }

    #[test]
    fn invalid_utf8_lines_are_skipped() {
        let mut bytes = vec![0xff, 0xfe, b'\n'];
        bytes.extend_from_slice(line("A", 0, "X", "info", r#""ok""#).as_bytes());
        let mut reader = TraceReader::new(Cursor::new(bytes), None).unwrap();
        let event = reader.next_event().unwrap().unwrap();
        assert_eq!(event.cmd, "X");
    }
}
