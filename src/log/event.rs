use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key under which a nested command writes into its parent's result scope.
///
/// Fan-out children are usually addressed by index, everything else by name.
/// On the wire an index is a JSON integer and a name is a JSON string.
/// Decoding never fails: any other value becomes a name from its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SlotKey {
    Index(u64),
    Name(String),
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Value::deserialize(d).map(SlotKey::from)
    }
}

impl From<Value> for SlotKey {
    fn from(v: Value) -> Self {
        match v {
            Value::Number(n) if n.is_u64() => SlotKey::Index(n.as_u64().unwrap_or_default()),
            Value::String(s) => SlotKey::Name(s),
            other => SlotKey::Name(other.to_string()),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Index(i) => write!(f, "{}", i),
            SlotKey::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for SlotKey {
    fn from(i: usize) -> Self {
        SlotKey::Index(i as u64)
    }
}

impl From<&str> for SlotKey {
    fn from(s: &str) -> Self {
        SlotKey::Name(s.to_string())
    }
}

impl From<String> for SlotKey {
    fn from(s: String) -> Self {
        SlotKey::Name(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CommandInput,
    CommandOutput,
    Info,
    Debug,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CommandInput => "command_input",
            EventKind::CommandOutput => "command_output",
            EventKind::Info => "info",
            EventKind::Debug => "debug",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a trace event: either a single line of text or a flat set of
/// named fields (kept in insertion order).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Fields(Map<String, Value>),
}

impl Message {
    /// Lines used by the outline renderer: the text itself, or one
    /// `key: value` line per field.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Message::Text(text) => vec![text.clone()],
            Message::Fields(fields) => fields
                .iter()
                .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                .collect(),
        }
    }

    /// Single-line form used by the human log format.
    pub fn compact(&self) -> String {
        match self {
            Message::Text(text) => text.clone(),
            Message::Fields(fields) => Value::Object(fields.clone()).to_string(),
        }
    }
}

/// Strings render bare, everything else as JSON text.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Message::Fields(fields)
    }
}

impl From<Value> for Message {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Message::Text(s),
            Value::Object(fields) => Message::Fields(fields),
            other => Message::Text(other.to_string()),
        }
    }
}

// Lenient: any JSON value is accepted and folded into one of the two shapes.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Message::from)
    }
}

/// One structured log entry emitted by a command tree.
///
/// JSON shape (field order as emitted):
/// {"sequence":"9f..","cmd":"HelloWorld","depth":1,"key":0,"kind":"info","msg":"Hello Avon"}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Correlation id shared by every event of one root execution.
    pub sequence: String,
    pub cmd: String,
    pub depth: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SlotKey>,

    pub kind: EventKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Message>,

    /// Raw line this event was decoded from (empty for emitted events).
    #[serde(skip)]
    pub line: String,
}

impl TraceEvent {
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn is_kind(&self, kind: EventKind) -> bool {
        self.kind == kind
    }

    pub fn is_command(&self, name: &str) -> bool {
        self.cmd == name
    }

    pub fn has_key(&self, key: &SlotKey) -> bool {
        self.key.as_ref() == Some(key)
    }

    /// Text must be equal; for fields, every expected field must be present
    /// with an equal value (extra fields on the event are allowed).
    pub fn matches_message(&self, expected: &Message) -> bool {
        match (&self.msg, expected) {
            (Some(Message::Text(actual)), Message::Text(want)) => actual == want,
            (Some(Message::Fields(actual)), Message::Fields(want)) => want
                .iter()
                .all(|(k, v)| actual.get(k).is_some_and(|a| a == v)),
            _ => false,
        }
    }
}
