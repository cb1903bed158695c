// OpenID token lifecycle
//
// Password-grant login and refresh-grant renewal against the realm's
// token endpoint. The manager hands out `Bearer` header values and only
// talks to the network when the cached token is (about to be) stale.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, join_path};

/// Token endpoint below the configured auth base URL.
pub const TOKEN_PATH: &str = "/auth/realms/master/protocol/openid-connect/token";

/// Anything that can produce a currently valid `Authorization` header value.
///
/// The catalog cache only needs "give me a bearer string"; tests plug in a
/// [`StaticToken`] instead of a full login.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn ensure_access(&self) -> Result<String, Error>;
}

/// Fixed bearer header, no lifecycle.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn ensure_access(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

/// Credentials and timing policy for the token endpoint.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Auth server root, e.g. `https://auth.example.com`.
    pub endpoint: Url,
    pub client_id: String,
    pub username: String,
    pub password: SecretString,
    /// Safety margin subtracted from both expiry windows.
    pub expiration_buffer: Duration,
}

/// Wire shape of the token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: f64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    refresh_expires_in: f64,
}

/// An issued token pair plus the instant the request was sent.
///
/// Expiry windows are measured from the request time, not the response
/// time, so a slow endpoint never extends the token's apparent lifetime.
#[derive(Debug)]
pub struct OpenIdToken {
    access_token: SecretString,
    expires_in: Duration,
    refresh_token: Option<SecretString>,
    refresh_expires_in: Duration,
    requested_at: Instant,
}

impl OpenIdToken {
    fn from_response(resp: TokenResponse, requested_at: Instant) -> Self {
        Self {
            access_token: SecretString::from(resp.access_token),
            expires_in: seconds(resp.expires_in),
            refresh_token: resp
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            refresh_expires_in: seconds(resp.refresh_expires_in),
            requested_at,
        }
    }

    fn access_valid(&self, now: Instant, buffer: Duration) -> bool {
        !self.access_token.expose_secret().is_empty()
            && now.duration_since(self.requested_at) < self.expires_in.saturating_sub(buffer)
    }

    fn refresh_valid(&self, now: Instant, buffer: Duration) -> bool {
        self.refresh_token.is_some()
            && now.duration_since(self.requested_at)
                < self.refresh_expires_in.saturating_sub(buffer)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Where the manager currently is in its token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Unauthenticated,
    AccessValid,
    AccessExpiredRefreshValid,
    Expired,
}

/// Obtains and renews bearer tokens for the catalog API.
///
/// The token lock is only held to read or replace the cached token, never
/// across the HTTP round trip. Two callers racing on an expired token may
/// both log in; the later response wins.
pub struct TokenManager {
    http: reqwest::Client,
    config: AuthConfig,
    token: Mutex<Option<OpenIdToken>>,
}

impl TokenManager {
    pub fn new(config: AuthConfig, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?, config))
    }

    /// Create a manager with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: AuthConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
        }
    }

    /// Current lifecycle state, evaluated against `Instant::now()`.
    pub fn state(&self) -> TokenState {
        let now = Instant::now();
        let buffer = self.config.expiration_buffer;
        let guard = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            None => TokenState::Unauthenticated,
            Some(t) if t.access_valid(now, buffer) => TokenState::AccessValid,
            Some(t) if t.refresh_valid(now, buffer) => TokenState::AccessExpiredRefreshValid,
            Some(_) => TokenState::Expired,
        }
    }

    /// Drop the cached token; the next call performs a full login.
    pub fn reset(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Return a valid `Bearer …` header value, refreshing or logging in
    /// as needed.
    ///
    /// Zero round trips while the access token is valid; one round trip for
    /// a refresh or a login; two only when a refresh is rejected and the
    /// manager falls back to a full login. A failed login clears the cached
    /// token and is returned to the caller.
    pub async fn ensure_access(&self) -> Result<String, Error> {
        let now = Instant::now();
        let buffer = self.config.expiration_buffer;

        let refresh_token = {
            let guard = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(t) if t.access_valid(now, buffer) => return Ok(t.bearer()),
                Some(t) if t.refresh_valid(now, buffer) => t.refresh_token.clone(),
                _ => None,
            }
        };

        if let Some(refresh_token) = refresh_token {
            debug!("access token expired, using refresh token");
            let params = [
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token.expose_secret()),
                ("grant_type", "refresh_token"),
            ];
            match self.request_token(&params).await {
                Ok(token) => return Ok(self.store(token)),
                Err(e) => warn!(error = %e, "unable to use refresh token"),
            }
        }

        info!("requesting new access token");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.expose_secret()),
            ("grant_type", "password"),
        ];
        match self.request_token(&params).await {
            Ok(token) => Ok(self.store(token)),
            Err(e) => {
                warn!(error = %e, "unable to get new access token");
                self.reset();
                Err(e)
            }
        }
    }

    fn store(&self, token: OpenIdToken) -> String {
        let bearer = token.bearer();
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        bearer
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<OpenIdToken, Error> {
        let url = join_path(&self.config.endpoint, TOKEN_PATH)?;
        let requested_at = Instant::now();

        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("invalid token response: {e}"),
                body: String::new(),
            })?;

        Ok(OpenIdToken::from_response(parsed, requested_at))
    }
}

#[async_trait]
impl AccessTokenSource for TokenManager {
    async fn ensure_access(&self) -> Result<String, Error> {
        TokenManager::ensure_access(self).await
    }
}
