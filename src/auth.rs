use hmac::{Hmac, Mac};
use log::debug;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters attached to every Graph API call.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthParams {
    access_token: String,
    appsecret_proof: Option<String>,
}

impl AuthParams {
    pub(crate) fn new(access_token: &str, app_secret: Option<&str>) -> Self {
        let appsecret_proof = app_secret.map(|secret| {
            debug!("Computing appsecret_proof for the page access token.");
            appsecret_proof(access_token, secret)
        });
        AuthParams {
            access_token: access_token.to_owned(),
            appsecret_proof,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn appsecret_proof(&self) -> Option<&str> {
        self.appsecret_proof.as_deref()
    }

    /// Ordered `(name, value)` pairs ready for a query string.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![("access_token".to_owned(), self.access_token.clone())];
        if let Some(proof) = &self.appsecret_proof {
            query.push(("appsecret_proof".to_owned(), proof.clone()));
        }
        query
    }
}

// Tokens stay out of debug output.
impl std::fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AuthParams")
            .field("access_token", &"<redacted>")
            .field("appsecret_proof", &self.appsecret_proof.is_some())
            .finish()
    }
}

/// Lowercase hex HMAC-SHA256 of `access_token`, keyed by `app_secret`.
pub fn appsecret_proof(access_token: &str, app_secret: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac key of any length is valid"));
    mac.update(access_token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
