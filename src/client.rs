use crate::config::ClientConfig;
use crate::message::{
    Attachment, Domains, ProfileField, SendOptions, SenderAction, UserFields,
};
use crate::transport::{ApiRequest, HttpTransport, Transport};
use failure::Fail;
use log::debug;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

pub type MessengerResult<T> = Result<T, MessengerError>;

#[derive(Debug, Fail)]
pub enum MessengerError {
    #[fail(display = "Configuration error: {}", _0)]
    Configuration(String),
    #[fail(display = "Invalid argument: {}", _0)]
    InvalidArgument(String),
    #[fail(display = "Request error: {}", _0)]
    Transport(#[cause] reqwest::Error),
}

impl From<reqwest::Error> for MessengerError {
    fn from(err: reqwest::Error) -> Self {
        MessengerError::Transport(err)
    }
}

/// Graph API client for one page.
///
/// Every method issues exactly one request and returns the decoded response
/// body untouched, including API-level `error` objects.
pub struct MessengerClient {
    config: ClientConfig,
    transport: Box<dyn Transport + Send + Sync>,
}

impl MessengerClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: impl Transport + Send + Sync + 'static,
    ) -> Self {
        MessengerClient {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /{recipient_id}` with the requested profile fields.
    pub fn fetch_user_profile(
        &self,
        recipient_id: &str,
        fields: impl Into<UserFields>,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let mut query = vec![("fields".to_owned(), fields.into().to_query_value())];
        query.extend(self.config.auth_params().to_query());
        self.execute(Method::GET, recipient_id, query, None, timeout)
    }

    pub fn send_message(
        &self,
        payload: Value,
        recipient_id: &str,
        options: SendOptions,
    ) -> MessengerResult<Value> {
        let mut body = json!({
            "messaging_type": options.messaging_type,
            "notification_type": options.notification_type,
            "recipient": {
                "id": recipient_id,
            },
            "message": payload,
        });
        if let Some(tag) = options.tag.filter(|tag| !tag.is_empty()) {
            body["tag"] = json!(tag);
        }
        self.post("me/messages", Some(body), options.timeout)
    }

    pub fn send_action(
        &self,
        sender_action: SenderAction,
        recipient_id: &str,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let body = json!({
            "recipient": {
                "id": recipient_id,
            },
            "sender_action": sender_action,
        });
        self.post("me/messages", Some(body), timeout)
    }

    /// Subscribes the app to the page's webhook events.
    pub fn subscribe_app(&self, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.post("me/subscribed_apps", None, timeout)
    }

    pub fn set_profile(&self, data: Value, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.post("me/messenger_profile", Some(data), timeout)
    }

    pub fn delete_profile_field(
        &self,
        field: ProfileField,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let body = json!({ "fields": [field] });
        self.execute(
            Method::DELETE,
            "me/messenger_profile",
            self.config.auth_params().to_query(),
            Some(body),
            timeout,
        )
    }

    pub fn delete_get_started(&self, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.delete_profile_field(ProfileField::GetStarted, timeout)
    }

    pub fn delete_ice_breakers(&self, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.delete_profile_field(ProfileField::IceBreakers, timeout)
    }

    pub fn delete_persistent_menu(&self, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.delete_profile_field(ProfileField::PersistentMenu, timeout)
    }

    /// Resolves an account linking token to the PSID of the user.
    pub fn link_account(
        &self,
        account_linking_token: &str,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let mut query = vec![
            ("fields".to_owned(), "recipient".to_owned()),
            (
                "account_linking_token".to_owned(),
                account_linking_token.to_owned(),
            ),
        ];
        query.extend(self.config.auth_params().to_query());
        self.execute(Method::POST, "me", query, None, timeout)
    }

    pub fn unlink_account(&self, psid: &str, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.post("me/unlink_accounts", Some(json!({ "psid": psid })), timeout)
    }

    pub fn set_whitelisted_domains(
        &self,
        domains: impl Into<Domains>,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let body = json!({ "whitelisted_domains": domains.into() });
        self.post("me/messenger_profile", Some(body), timeout)
    }

    pub fn remove_whitelisted_domains(&self, timeout: Option<Duration>) -> MessengerResult<Value> {
        self.delete_profile_field(ProfileField::WhitelistedDomains, timeout)
    }

    /// Uploads a url-backed attachment so it can be reused by id.
    ///
    /// Fails before any request if the attachment has no url or carries
    /// quick replies.
    pub fn upload_attachment(
        &self,
        attachment: &Attachment,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        if attachment.url.as_deref().map_or(true, str::is_empty) {
            return Err(MessengerError::InvalidArgument(
                "Attachment must have `url` specified".to_owned(),
            ));
        }
        if !attachment.quick_replies.is_empty() {
            return Err(MessengerError::InvalidArgument(
                "Attachment may not have `quick_replies`".to_owned(),
            ));
        }
        let body = json!({ "message": attachment.to_value() });
        self.post("me/message_attachments", Some(body), timeout)
    }

    fn post(
        &self,
        path: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        self.execute(
            Method::POST,
            path,
            self.config.auth_params().to_query(),
            body,
            timeout,
        )
    }

    fn execute(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        let url = format!("{}/{}", self.config.api_root(), path);
        debug!("Building {} request for [{}].", method, url);
        self.transport.execute(ApiRequest {
            method,
            url,
            query,
            body,
            timeout,
        })
    }
}
