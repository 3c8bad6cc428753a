use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt::{self, Display, Formatter};

/// Recognized messaging event keys, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountLinking,
    Delivery,
    Message,
    Optin,
    Postback,
    Read,
}

impl EventKind {
    pub const PRIORITY: [EventKind; 6] = [
        EventKind::AccountLinking,
        EventKind::Delivery,
        EventKind::Message,
        EventKind::Optin,
        EventKind::Postback,
        EventKind::Read,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EventKind::AccountLinking => "account_linking",
            EventKind::Delivery => "delivery",
            EventKind::Message => "message",
            EventKind::Optin => "optin",
            EventKind::Postback => "postback",
            EventKind::Read => "read",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single entry of a `messaging` array, kept as the raw JSON mapping so
/// handlers see every field the platform sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    pub fn new(fields: Map<String, Value>) -> Self {
        Event(fields)
    }

    /// First recognized key carrying a non-empty value, by priority.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::PRIORITY
            .iter()
            .copied()
            .find(|kind| self.has(kind.key()))
    }

    /// `null`, `false`, `0`, `""`, `[]` and `{}` count as absent.
    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).map_or(false, is_set)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.pointer_str("/sender/id")
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.pointer_str("/recipient/id")
    }

    pub fn timestamp(&self) -> Option<&Number> {
        match self.0.get("timestamp") {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn message_text(&self) -> Option<&str> {
        self.pointer_str("/message/text")
    }

    pub fn quick_reply_payload(&self) -> Option<&str> {
        self.pointer_str("/message/quick_reply/payload")
    }

    pub fn postback_payload(&self) -> Option<&str> {
        self.pointer_str("/postback/payload")
    }

    fn pointer_str(&self, pointer: &str) -> Option<&str> {
        let mut parts = pointer.trim_start_matches('/').split('/');
        let first = parts.next()?;
        parts
            .try_fold(self.0.get(first)?, |value, part| value.get(part))?
            .as_str()
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Event(fields)
    }
}
