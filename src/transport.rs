use crate::client::MessengerResult;
use log::{debug, error};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

/// One fully built Graph API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Executes an [`ApiRequest`] and returns the decoded JSON response body.
///
/// Implementations must not interpret the body: API-level `error` objects
/// are returned as-is.
pub trait Transport {
    fn execute(&self, request: ApiRequest) -> MessengerResult<Value>;
}

/// Blocking `reqwest` transport. Connection pooling, TLS and the default
/// timeout are whatever the wrapped client is configured with.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> MessengerResult<Value> {
        debug!("Sending {} request to [{}].", request.method, request.url);
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        let res = builder.send().map_err(|err| {
            error!("Request to [{}] failed: {}", request.url, err);
            err
        })?;
        debug!(
            "Received response from [{}]. Status[{}]",
            request.url,
            res.status()
        );
        Ok(res.json()?)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: ApiRequest) -> MessengerResult<Value> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: ApiRequest) -> MessengerResult<Value> {
        (**self).execute(request)
    }
}
