use crate::client::{MessengerClient, MessengerError, MessengerResult};
use crate::event::{Event, EventKind};
use crate::message::{SendOptions, SenderAction, UserFields};
use crate::webhook::{PayloadError, WebhookPayload};
use log::debug;
use serde_json::Value;
use std::time::Duration;

/// Callbacks for the six recognized messaging events.
///
/// Each callback receives the context of the event being dispatched, which
/// carries the sender identity for replies, and the raw event mapping.
pub trait HandleEvent {
    type Output;

    fn account_linking(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
    fn delivery(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
    fn message(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
    fn optin(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
    fn postback(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
    fn read(&self, ctx: &EventContext<'_>, event: &Event) -> Self::Output;
}

/// Binds one dispatched event to the client, so replies go to that event's
/// sender and nobody else's.
#[derive(Clone, Copy)]
pub struct EventContext<'a> {
    client: &'a MessengerClient,
    event: &'a Event,
}

impl<'a> EventContext<'a> {
    pub fn new(client: &'a MessengerClient, event: &'a Event) -> Self {
        EventContext { client, event }
    }

    pub fn client(&self) -> &'a MessengerClient {
        self.client
    }

    pub fn event(&self) -> &'a Event {
        self.event
    }

    /// Sender PSID of the event.
    pub fn user_id(&self) -> MessengerResult<&'a str> {
        self.event.sender_id().ok_or_else(|| {
            MessengerError::InvalidArgument("event has no `sender.id`".to_owned())
        })
    }

    pub fn get_user(
        &self,
        fields: impl Into<UserFields>,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        self.client
            .fetch_user_profile(self.user_id()?, fields, timeout)
    }

    pub fn send(&self, payload: Value, options: SendOptions) -> MessengerResult<Value> {
        self.client.send_message(payload, self.user_id()?, options)
    }

    pub fn send_action(
        &self,
        sender_action: SenderAction,
        timeout: Option<Duration>,
    ) -> MessengerResult<Value> {
        self.client
            .send_action(sender_action, self.user_id()?, timeout)
    }
}

/// Routes webhook events to a [`HandleEvent`] implementation.
pub struct Messenger<H> {
    client: MessengerClient,
    handler: H,
}

impl<H: HandleEvent> Messenger<H> {
    pub fn new(client: MessengerClient, handler: H) -> Self {
        Messenger { client, handler }
    }

    pub fn client(&self) -> &MessengerClient {
        &self.client
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Dispatches every event of every entry, in order, and returns the
    /// results of the events that matched a handler.
    pub fn handle(&self, payload: &WebhookPayload) -> Vec<H::Output> {
        debug!("Handling webhook payload with {} entries.", payload.entry.len());
        payload
            .events()
            .filter_map(|event| self.handle_event(event))
            .collect()
    }

    pub fn handle_str(&self, body: &str) -> Result<Vec<H::Output>, PayloadError> {
        let payload: WebhookPayload = body.parse()?;
        Ok(self.handle(&payload))
    }

    /// Dispatches one event to the first matching handler by key priority.
    /// Returns `None` when the event carries no recognized key.
    pub fn handle_event(&self, event: &Event) -> Option<H::Output> {
        let ctx = EventContext::new(&self.client, event);
        let kind = match event.kind() {
            Some(kind) => kind,
            None => {
                debug!("Skipping webhook event with no recognized key.");
                return None;
            }
        };
        debug!("Dispatching `{}` webhook event.", kind);
        let output = match kind {
            EventKind::AccountLinking => self.handler.account_linking(&ctx, event),
            EventKind::Delivery => self.handler.delivery(&ctx, event),
            EventKind::Message => self.handler.message(&ctx, event),
            EventKind::Optin => self.handler.optin(&ctx, event),
            EventKind::Postback => self.handler.postback(&ctx, event),
            EventKind::Read => self.handler.read(&ctx, event),
        };
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records `(kind, sender)` for every callback and echoes text messages.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(EventKind, Option<String>)>>,
    }

    impl Recorder {
        fn record(&self, kind: EventKind, ctx: &EventContext<'_>) -> EventKind {
            let sender = ctx.user_id().ok().map(str::to_owned);
            self.calls.lock().unwrap().push((kind, sender));
            kind
        }

        fn calls(&self) -> Vec<(EventKind, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl HandleEvent for Recorder {
        type Output = EventKind;

        fn account_linking(&self, ctx: &EventContext<'_>, _event: &Event) -> EventKind {
            self.record(EventKind::AccountLinking, ctx)
        }

        fn delivery(&self, ctx: &EventContext<'_>, _event: &Event) -> EventKind {
            self.record(EventKind::Delivery, ctx)
        }

        fn message(&self, ctx: &EventContext<'_>, event: &Event) -> EventKind {
            if let Some(text) = event.message_text() {
                ctx.send(json!({ "text": text }), SendOptions::default())
                    .unwrap();
            }
            self.record(EventKind::Message, ctx)
        }

        fn optin(&self, ctx: &EventContext<'_>, _event: &Event) -> EventKind {
            self.record(EventKind::Optin, ctx)
        }

        fn postback(&self, ctx: &EventContext<'_>, _event: &Event) -> EventKind {
            self.record(EventKind::Postback, ctx)
        }

        fn read(&self, ctx: &EventContext<'_>, _event: &Event) -> EventKind {
            self.record(EventKind::Read, ctx)
        }
    }

    fn messenger() -> (Messenger<Recorder>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(json!({"message_id": "m1"})));
        let client = MessengerClient::with_transport(
            ClientConfig::new("page-token").unwrap(),
            transport.clone(),
        );
        (Messenger::new(client, Recorder::default()), transport)
    }

    fn payload(value: Value) -> WebhookPayload {
        WebhookPayload::from_value(value).unwrap()
    }

    #[test]
    fn message_event_is_dispatched_and_replied_to_sender() {
        let (messenger, transport) = messenger();
        let results = messenger.handle(&payload(json!({
            "entry": [{"messaging": [{"sender": {"id": "1"}, "message": {"text": "hi"}}]}]
        })));
        assert_eq!(results, vec![EventKind::Message]);
        assert_eq!(
            messenger.handler().calls(),
            vec![(EventKind::Message, Some("1".to_owned()))]
        );
        let request = transport.last();
        assert_eq!(request.body.unwrap()["recipient"]["id"], "1");
    }

    #[test]
    fn postback_wins_over_read() {
        let (messenger, _) = messenger();
        let results = messenger.handle(&payload(json!({
            "entry": [{"messaging": [{
                "sender": {"id": "1"},
                "postback": {"payload": "GET_STARTED"},
                "read": {"watermark": 1458668856253u64}
            }]}]
        })));
        assert_eq!(results, vec![EventKind::Postback]);
    }

    #[test]
    fn every_entry_and_event_is_dispatched() {
        let (messenger, _) = messenger();
        let results = messenger.handle(&payload(json!({
            "entry": [
                {"messaging": [{"sender": {"id": "1"}, "delivery": {"watermark": 1}}]},
                {"messaging": [
                    {"sender": {"id": "2"}, "optin": {"ref": "PASS_THROUGH"}},
                    {"sender": {"id": "3"}, "account_linking": {"status": "unlinked"}}
                ]}
            ]
        })));
        assert_eq!(
            results,
            vec![EventKind::Delivery, EventKind::Optin, EventKind::AccountLinking]
        );
        assert_eq!(
            messenger.handler().calls(),
            vec![
                (EventKind::Delivery, Some("1".to_owned())),
                (EventKind::Optin, Some("2".to_owned())),
                (EventKind::AccountLinking, Some("3".to_owned())),
            ]
        );
    }

    #[test]
    fn replies_follow_each_events_sender() {
        let (messenger, transport) = messenger();
        messenger
            .handle_str(
                r#"{"entry": [
                    {"messaging": [{"sender": {"id": "alice"}, "message": {"text": "a"}}]},
                    {"messaging": [{"sender": {"id": "bob"}, "message": {"text": "b"}}]}
                ]}"#,
            )
            .unwrap();
        let recipients: Vec<Value> = transport
            .requests()
            .into_iter()
            .map(|request| request.body.unwrap()["recipient"]["id"].clone())
            .collect();
        assert_eq!(recipients, vec![json!("alice"), json!("bob")]);
    }

    #[test]
    fn empty_message_falls_through_to_read() {
        let (messenger, _) = messenger();
        let results = messenger.handle(&payload(json!({
            "entry": [{"messaging": [
                {"sender": {"id": "1"}, "message": {}, "read": {"watermark": 1}}
            ]}]
        })));
        assert_eq!(results, vec![EventKind::Read]);
    }

    #[test]
    fn context_send_forwards_timeout_and_auth() {
        let transport = Arc::new(RecordingTransport::new(json!({"message_id": "m1"})));
        let client = MessengerClient::with_transport(
            ClientConfig::new("page-token")
                .unwrap()
                .with_app_secret("app-secret"),
            transport.clone(),
        );
        let event: Event =
            serde_json::from_value(json!({"sender": {"id": "9"}, "message": {"text": "x"}}))
                .unwrap();
        let ctx = EventContext::new(&client, &event);
        ctx.send(
            json!({"text": "pong"}),
            SendOptions::new().timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let request = transport.last();
        assert_eq!(request.timeout, Some(Duration::from_secs(2)));
        assert_eq!(
            request.query,
            vec![
                ("access_token".to_owned(), "page-token".to_owned()),
                (
                    "appsecret_proof".to_owned(),
                    crate::appsecret_proof("page-token", "app-secret"),
                ),
            ]
        );
        assert_eq!(request.body.unwrap()["recipient"]["id"], "9");
    }

    #[test]
    fn unrecognized_event_is_skipped() {
        let (messenger, transport) = messenger();
        let results = messenger.handle(&payload(json!({
            "entry": [{"messaging": [
                {"sender": {"id": "1"}, "reaction": {"emoji": "+"}},
                {"sender": {"id": "1"}, "read": {"watermark": 1}}
            ]}]
        })));
        assert_eq!(results, vec![EventKind::Read]);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn missing_sender_fails_user_id() {
        let (messenger, transport) = messenger();
        let event: Event = serde_json::from_value(json!({"optin": {"ref": "x"}})).unwrap();
        let ctx = EventContext::new(messenger.client(), &event);
        match ctx.send_action(SenderAction::MarkSeen, None) {
            Err(MessengerError::InvalidArgument(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn context_get_user_uses_sender() {
        let (messenger, transport) = messenger();
        let event: Event =
            serde_json::from_value(json!({"sender": {"id": "77"}, "message": {}})).unwrap();
        let ctx = EventContext::new(messenger.client(), &event);
        assert_eq!(ctx.user_id().unwrap(), "77");
        ctx.get_user(UserFields::Default, None).unwrap();
        assert_eq!(
            transport.last().url,
            "https://graph.facebook.com/v2.12/77"
        );
    }

    #[test]
    fn malformed_body_is_reported() {
        let (messenger, _) = messenger();
        assert!(messenger.handle_str("not json").is_err());
    }
}
