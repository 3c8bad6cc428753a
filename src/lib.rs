//! Client and webhook dispatcher for the Messenger Platform Graph API.

// `failure`'s derive expands to impls inside a const block.
#![allow(non_local_definitions)]

mod auth;
mod client;
mod config;
pub mod event;
pub mod message;
mod messenger;
pub mod transport;
pub mod webhook;

pub use auth::{appsecret_proof, AuthParams};
pub use client::{MessengerClient, MessengerError, MessengerResult};
pub use config::{ApiVersion, ClientConfig};
pub use event::{Event, EventKind};
pub use messenger::{EventContext, HandleEvent, Messenger};
pub use webhook::{Entry, PayloadError, WebhookPayload};
