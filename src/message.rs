//! Outbound payload types for the Send API and the messenger profile.

use crate::client::MessengerError;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:expr, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = MessengerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(MessengerError::InvalidArgument(format!(
                        "`{}` is not a valid `{}`",
                        s, $label
                    ))),
                }
            }
        }
    };
}

string_enum!(
    /// Delivery policy of an outbound message.
    MessagingType, "messaging_type", {
        Response => "RESPONSE",
        Update => "UPDATE",
        MessageTag => "MESSAGE_TAG",
    }
);

string_enum!(
    /// Push notification behavior of an outbound message.
    NotificationType, "notification_type", {
        Regular => "REGULAR",
        SilentPush => "SILENT_PUSH",
        NoPush => "NO_PUSH",
    }
);

string_enum!(
    SenderAction, "sender_action", {
        MarkSeen => "mark_seen",
        TypingOn => "typing_on",
        TypingOff => "typing_off",
    }
);

string_enum!(
    /// Top-level messenger profile properties that can be deleted.
    ProfileField, "profile field", {
        GetStarted => "get_started",
        IceBreakers => "ice_breakers",
        PersistentMenu => "persistent_menu",
        WhitelistedDomains => "whitelisted_domains",
    }
);

impl Default for MessagingType {
    fn default() -> Self {
        MessagingType::Response
    }
}

impl Default for NotificationType {
    fn default() -> Self {
        NotificationType::Regular
    }
}

/// Optional knobs for `send_message`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub messaging_type: MessagingType,
    pub notification_type: NotificationType,
    pub tag: Option<String>,
    pub timeout: Option<Duration>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messaging_type(mut self, messaging_type: MessagingType) -> Self {
        self.messaging_type = messaging_type;
        self
    }

    pub fn notification_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = notification_type;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds options from raw platform strings, rejecting unknown values.
    pub fn parse(messaging_type: &str, notification_type: &str) -> Result<Self, MessengerError> {
        Ok(SendOptions {
            messaging_type: messaging_type.parse()?,
            notification_type: notification_type.parse()?,
            ..Self::default()
        })
    }
}

/// The `fields` query of a user profile lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFields {
    Default,
    Raw(String),
    List(Vec<String>),
}

pub const DEFAULT_USER_FIELDS: &str = "first_name,last_name,profile_pic,locale,timezone,gender";

impl UserFields {
    pub fn to_query_value(&self) -> String {
        match self {
            UserFields::Default => DEFAULT_USER_FIELDS.to_owned(),
            UserFields::Raw(fields) => fields.clone(),
            UserFields::List(fields) => fields.join(","),
        }
    }
}

impl Default for UserFields {
    fn default() -> Self {
        UserFields::Default
    }
}

impl From<&str> for UserFields {
    fn from(fields: &str) -> Self {
        UserFields::Raw(fields.to_owned())
    }
}

impl From<String> for UserFields {
    fn from(fields: String) -> Self {
        UserFields::Raw(fields)
    }
}

impl From<Vec<String>> for UserFields {
    fn from(fields: Vec<String>) -> Self {
        UserFields::List(fields)
    }
}

impl From<&[&str]> for UserFields {
    fn from(fields: &[&str]) -> Self {
        UserFields::List(fields.iter().map(|f| (*f).to_owned()).collect())
    }
}

impl From<Option<UserFields>> for UserFields {
    fn from(fields: Option<UserFields>) -> Self {
        fields.unwrap_or_default()
    }
}

/// Domains for the messenger profile whitelist. A single domain becomes a
/// one-element list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Domains(pub Vec<String>);

impl From<&str> for Domains {
    fn from(domain: &str) -> Self {
        Domains(vec![domain.to_owned()])
    }
}

impl From<String> for Domains {
    fn from(domain: String) -> Self {
        Domains(vec![domain])
    }
}

impl From<Vec<String>> for Domains {
    fn from(domains: Vec<String>) -> Self {
        Domains(domains)
    }
}

impl From<Vec<&str>> for Domains {
    fn from(domains: Vec<&str>) -> Self {
        Domains(domains.into_iter().map(str::to_owned).collect())
    }
}

string_enum!(
    AttachmentType, "attachment type", {
        Image => "image",
        Audio => "audio",
        Video => "video",
        File => "file",
    }
);

/// A media attachment, sent inline or uploaded for reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub attachment_type: AttachmentType,
    pub url: Option<String>,
    pub is_reusable: Option<bool>,
    pub quick_replies: Vec<Value>,
}

impl Attachment {
    pub fn new(attachment_type: AttachmentType, url: impl Into<String>) -> Self {
        Attachment {
            attachment_type,
            url: Some(url.into()),
            is_reusable: None,
            quick_replies: Vec::new(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::new(AttachmentType::Image, url)
    }

    pub fn audio(url: impl Into<String>) -> Self {
        Self::new(AttachmentType::Audio, url)
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::new(AttachmentType::Video, url)
    }

    pub fn file(url: impl Into<String>) -> Self {
        Self::new(AttachmentType::File, url)
    }

    pub fn reusable(mut self, is_reusable: bool) -> Self {
        self.is_reusable = Some(is_reusable);
        self
    }

    pub fn quick_reply(mut self, quick_reply: Value) -> Self {
        self.quick_replies.push(quick_reply);
        self
    }

    /// The `message` object of the Send API.
    pub fn to_value(&self) -> Value {
        let mut payload = json!({});
        if let Some(url) = &self.url {
            payload["url"] = json!(url);
        }
        if let Some(is_reusable) = self.is_reusable {
            payload["is_reusable"] = json!(is_reusable);
        }
        let mut message = json!({
            "attachment": {
                "type": self.attachment_type,
                "payload": payload,
            }
        });
        if !self.quick_replies.is_empty() {
            message["quick_replies"] = json!(self.quick_replies);
        }
        message
    }
}
