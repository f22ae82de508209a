//! Google OAuth 2.0 token management for the Gmail API.
//!
//! The token lifecycle is modelled explicitly: a token is absent, valid,
//! expired-but-refreshable, or invalid. Refreshed tokens are surfaced back to
//! the caller as JSON so the caller decides where to persist them.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Expiry buffer so a token that is about to lapse counts as expired.
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Lifecycle state of the cached access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No access token has been obtained yet.
    Absent,
    /// A cached access token exists and has not expired.
    Valid,
    /// The cached token expired (or none exists) but refresh credentials are
    /// available.
    ExpiredRefreshable,
    /// The token expired and there is no way to refresh it.
    Invalid,
}

/// Credentials for the Gmail OAuth flow.
#[derive(Debug, Clone, Default)]
pub struct GoogleAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Pre-generated access token (skips the refresh flow entirely).
    pub access_token: Option<String>,
}

impl GoogleAuthConfig {
    /// Load credentials from environment variables.
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            refresh_token: std::env::var("GOOGLE_REFRESH_TOKEN").ok(),
            access_token: std::env::var("GOOGLE_ACCESS_TOKEN").ok(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.access_token.is_some() || self.can_refresh()
    }

    fn can_refresh(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("json error: {0}")]
    Json(String),
}

#[derive(Debug)]
struct GoogleAuthInner {
    config: GoogleAuthConfig,
    access_token: Option<String>,
    token_expires_at: Option<Instant>,
    /// Serialized token from the last refresh, held until the caller takes it.
    refreshed_token_json: Option<String>,
}

/// Cached, refreshable access token shared across client calls.
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    inner: Arc<RwLock<GoogleAuthInner>>,
    token_url: String,
}

impl GoogleAuth {
    pub fn new(config: GoogleAuthConfig) -> Result<Self, AuthError> {
        if !config.is_valid() {
            return Err(AuthError::MissingCredentials(
                "either GOOGLE_ACCESS_TOKEN or (GOOGLE_CLIENT_ID + GOOGLE_CLIENT_SECRET + GOOGLE_REFRESH_TOKEN) must be set".to_string(),
            ));
        }

        // Pre-generated tokens are assumed valid for one hour.
        let (access_token, token_expires_at) = match config.access_token.clone() {
            Some(token) => (Some(token), Some(Instant::now() + Duration::from_secs(3600))),
            None => (None, None),
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(GoogleAuthInner {
                config,
                access_token,
                token_expires_at,
                refreshed_token_json: None,
            })),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(GoogleAuthConfig::from_env())
    }

    /// Override the token endpoint (tests).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Current lifecycle state of the cached token.
    pub fn state(&self) -> TokenState {
        let inner = self.inner.read().unwrap();
        let usable = matches!(
            (&inner.access_token, &inner.token_expires_at),
            (Some(_), Some(expires_at)) if *expires_at > Instant::now() + EXPIRY_BUFFER
        );
        match (usable, inner.access_token.is_some()) {
            (true, _) => TokenState::Valid,
            (false, false) if !inner.config.can_refresh() => TokenState::Absent,
            (false, _) if inner.config.can_refresh() => TokenState::ExpiredRefreshable,
            _ => TokenState::Invalid,
        }
    }

    /// Get a usable access token, refreshing first when required.
    pub fn access_token(&self) -> Result<String, AuthError> {
        match self.state() {
            TokenState::Valid => {
                let inner = self.inner.read().unwrap();
                Ok(inner.access_token.clone().unwrap_or_default())
            }
            TokenState::ExpiredRefreshable => self.refresh(),
            TokenState::Absent => Err(AuthError::MissingCredentials(
                "no access token and no refresh credentials".to_string(),
            )),
            TokenState::Invalid => Err(AuthError::RefreshFailed(
                "token expired and no refresh credentials are available".to_string(),
            )),
        }
    }

    /// Token JSON produced by the last refresh, if the caller has not taken it
    /// yet. The caller owns persistence.
    pub fn take_refreshed_token_json(&self) -> Option<String> {
        self.inner.write().unwrap().refreshed_token_json.take()
    }

    fn refresh(&self) -> Result<String, AuthError> {
        let (client_id, client_secret, refresh_token) = {
            let inner = self.inner.read().unwrap();
            let config = &inner.config;
            match (
                config.client_id.clone(),
                config.client_secret.clone(),
                config.refresh_token.clone(),
            ) {
                (Some(id), Some(secret), Some(token)) => (id, secret, token),
                _ => {
                    return Err(AuthError::MissingCredentials(
                        "refresh requires GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REFRESH_TOKEN".to_string(),
                    ))
                }
            }
        };

        debug!("refreshing google oauth token");
        let client = reqwest::blocking::Client::new();
        let response = client
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .map_err(|err| AuthError::Http(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            error!("oauth token refresh failed: {} - {}", status, body);
            return Err(AuthError::RefreshFailed(format!("HTTP {}: {}", status, body)));
        }

        let token: OAuthTokenResponse = response
            .json()
            .map_err(|err| AuthError::Json(err.to_string()))?;
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in.max(0) as u64);

        let stored = StoredToken {
            access_token: token.access_token.clone(),
            refresh_token: refresh_token.clone(),
            client_id,
            client_secret,
        };
        let token_json =
            serde_json::to_string(&stored).map_err(|err| AuthError::Json(err.to_string()))?;

        {
            let mut inner = self.inner.write().unwrap();
            inner.access_token = Some(token.access_token.clone());
            inner.token_expires_at = Some(expires_at);
            inner.refreshed_token_json = Some(token_json);
        }

        debug!("google oauth token refreshed");
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    scope: Option<String>,
}

/// Shape persisted by callers after a refresh.
#[derive(Debug, Serialize)]
struct StoredToken {
    access_token: String,
    refresh_token: String,
    client_id: String,
    client_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refreshable_config() -> GoogleAuthConfig {
        GoogleAuthConfig {
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            access_token: None,
        }
    }

    #[test]
    fn config_validation() {
        assert!(!GoogleAuthConfig::default().is_valid());
        assert!(refreshable_config().is_valid());
        let token_only = GoogleAuthConfig {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        assert!(token_only.is_valid());
    }

    #[test]
    fn token_states() {
        let auth = GoogleAuth::new(GoogleAuthConfig {
            access_token: Some("token".to_string()),
            ..Default::default()
        })
        .expect("auth");
        assert_eq!(auth.state(), TokenState::Valid);

        let auth = GoogleAuth::new(refreshable_config()).expect("auth");
        assert_eq!(auth.state(), TokenState::ExpiredRefreshable);

        // Expire a token-only auth by hand: no refresh path left.
        let auth = GoogleAuth::new(GoogleAuthConfig {
            access_token: Some("token".to_string()),
            ..Default::default()
        })
        .expect("auth");
        {
            let mut inner = auth.inner.write().unwrap();
            inner.token_expires_at = Some(Instant::now() - Duration::from_secs(1));
        }
        assert_eq!(auth.state(), TokenState::Invalid);

        let mut config = refreshable_config();
        config.refresh_token = None;
        assert!(GoogleAuth::new(config).is_err());
    }

    #[test]
    fn refresh_updates_cache_and_exposes_token_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"fresh","expires_in":3600,"token_type":"Bearer"}"#)
            .create();

        let auth = GoogleAuth::new(refreshable_config())
            .expect("auth")
            .with_token_url(format!("{}/token", server.url()));

        let token = auth.access_token().expect("token");
        assert_eq!(token, "fresh");
        assert_eq!(auth.state(), TokenState::Valid);

        let json = auth.take_refreshed_token_json().expect("token json");
        assert!(json.contains("\"access_token\":\"fresh\""));
        assert!(json.contains("\"refresh_token\":\"refresh\""));
        assert!(auth.take_refreshed_token_json().is_none());
        mock.assert();
    }

    #[test]
    fn refresh_failure_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create();

        let auth = GoogleAuth::new(refreshable_config())
            .expect("auth")
            .with_token_url(format!("{}/token", server.url()));
        let err = auth.access_token().expect_err("refresh should fail");
        assert!(matches!(err, AuthError::RefreshFailed(_)));
    }
}
