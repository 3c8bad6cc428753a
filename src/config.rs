use crate::auth::AuthParams;
use crate::client::{MessengerError, MessengerResult};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

const GRAPH_URL: &str = "https://graph.facebook.com";

/// Graph API version, e.g. `2.12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: u8,
    pub minor: u8,
}

impl ApiVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        ApiVersion { major, minor }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        ApiVersion::new(2, 12)
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = MessengerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MessengerError::InvalidArgument(format!("`{}` is not a valid api version", s));
        let trimmed = s.trim_start_matches('v');
        let mut parts = trimmed.splitn(2, '.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        Ok(ApiVersion::new(major, minor))
    }
}

/// Credentials and API version for one page integration.
///
/// Immutable once built. The auth query parameters are derived on first use
/// and cached for the lifetime of the config.
pub struct ClientConfig {
    access_token: String,
    app_secret: Option<String>,
    api_version: ApiVersion,
    auth_params: OnceLock<AuthParams>,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> MessengerResult<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(MessengerError::Configuration(
                "a page access token is required".to_owned(),
            ));
        }
        Ok(ClientConfig {
            access_token,
            app_secret: None,
            api_version: ApiVersion::default(),
            auth_params: OnceLock::new(),
        })
    }

    /// Enables `appsecret_proof` on every request. An empty secret is ignored.
    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        let app_secret = app_secret.into();
        self.app_secret = if app_secret.is_empty() {
            None
        } else {
            Some(app_secret)
        };
        self.auth_params = OnceLock::new();
        self
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// `https://graph.facebook.com/v{major}.{minor}`
    pub fn api_root(&self) -> String {
        format!("{}/v{}", GRAPH_URL, self.api_version)
    }

    pub fn auth_params(&self) -> &AuthParams {
        self.auth_params
            .get_or_init(|| AuthParams::new(&self.access_token, self.app_secret.as_deref()))
    }
}

// Credentials stay out of debug output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"<redacted>")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .finish()
    }
}
