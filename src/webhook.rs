use crate::event::Event;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::convert::TryFrom;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Body of a webhook POST: `{"object": "page", "entry": [...]}`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    pub entry: Vec<Entry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<Number>,
    #[serde(default)]
    pub messaging: Vec<Event>,
}

impl WebhookPayload {
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Every event of every entry, in delivery order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entry.iter().flat_map(|entry| entry.messaging.iter())
    }
}

impl FromStr for WebhookPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl TryFrom<String> for WebhookPayload {
    type Error = PayloadError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug)]
pub enum PayloadError {
    Parse(serde_json::Error),
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PayloadError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PayloadError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Parse(err)
    }
}
