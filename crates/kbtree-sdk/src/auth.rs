//! Credentials and the identity provider used to obtain them

use async_trait::async_trait;
use std::fmt;
use zeroize::Zeroizing;

use crate::SdkError;

/// Default login endpoint of the KBase authentication service
pub const DEFAULT_AUTH_URL: &str = "https://kbase.us/services/authorization/Sessions/Login";

/// Auth token attached to outbound calls
///
/// The token is wiped from memory on drop and never shows up in `Debug`
/// output.
#[derive(Clone)]
pub struct AuthToken {
    token: Zeroizing<String>,
    user_id: Option<String>,
}

impl AuthToken {
    /// Wrap a token obtained out of band
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            user_id: None,
        }
    }

    /// Wrap a token together with the user it was issued for
    pub fn with_user(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            user_id: Some(user_id.into()),
        }
    }

    /// The raw token, as sent in the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// User the token belongs to, when known
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Exchanges a username/password pair for an [`AuthToken`]
///
/// Implementations must report a rejected pair as
/// [`SdkError::Unauthorized`] and any failure to complete the exchange as
/// [`SdkError::Io`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate and return a token
    async fn authenticate(&self, user: &str, password: &str) -> Result<AuthToken, SdkError>;
}

/// Identity provider backed by the KBase login endpoint
#[cfg(feature = "http")]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http")]
impl HttpIdentityProvider {
    /// Provider talking to `url`
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    /// Login endpoint this provider talks to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
impl Default for HttpIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_URL)
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct LoginResponse {
    token: Option<String>,
    user_id: Option<String>,
    error_msg: Option<String>,
}

#[cfg(feature = "http")]
#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn authenticate(&self, user: &str, password: &str) -> Result<AuthToken, SdkError> {
        tracing::debug!(user, url = %self.url, "requesting auth token");

        let form = [
            ("user_id", user),
            ("password", password),
            ("fields", "un,token,user_id,name"),
        ];
        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| SdkError::Io(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SdkError::Io(e.to_string()))?;
        let parsed = serde_json::from_slice::<LoginResponse>(&body).ok();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let reason = parsed
                .and_then(|r| r.error_msg)
                .unwrap_or_else(|| "login rejected".to_string());
            tracing::warn!(user, %status, "identity provider rejected credentials");
            return Err(SdkError::Unauthorized(reason));
        }
        if !status.is_success() {
            return Err(SdkError::Io(format!("identity provider returned HTTP {}", status)));
        }

        let parsed = parsed.ok_or_else(|| {
            SdkError::Io("identity provider returned a malformed response".to_string())
        })?;
        match parsed.token {
            Some(token) => Ok(AuthToken {
                token: Zeroizing::new(token),
                user_id: parsed.user_id.or_else(|| Some(user.to_string())),
            }),
            None => Err(SdkError::Io(
                parsed
                    .error_msg
                    .unwrap_or_else(|| "identity provider response has no token".to_string()),
            )),
        }
    }
}
