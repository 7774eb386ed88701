//! Authentication: bot-token login, session credentials, and the session store
//! the live-updates handshake reads from.
//!
//! ## Security Model
//!
//! The bearer token lives inside the HTTP client (private field) and is sent as
//! an `Authorization` header. It is never exposed through a public accessor;
//! the connection manager reads it through [`SessionStore`] only to build the
//! `auth` handshake frame.

#[cfg(feature = "http")]
pub mod client;

use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::shared::AccountId;

// ============================================================================
// Session store
// ============================================================================

/// Read-only access to the caller's session credential.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, `None` when logged out.
    fn bearer_token(&self) -> BoxFuture<'_, Option<String>>;
}

/// Fixed credential, for tooling and tests.
#[derive(Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StaticSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSession")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SessionStore for StaticSession {
    fn bearer_token(&self) -> BoxFuture<'_, Option<String>> {
        let token = self.token.clone();
        async move { token }.boxed()
    }
}

// ============================================================================
// Profile & credential types
// ============================================================================

/// The dashboard account behind a bot token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub account_id: AccountId,
    pub bot_username: Option<String>,
    pub display_name: Option<String>,
}

/// Internal auth session state. Token is NEVER stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub account_id: AccountId,
    pub expires_at: DateTime<Utc>,
}

impl AuthCredentials {
    /// Whether the session is still valid (not expired).
    pub fn is_authenticated(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Login request body sent to the auth service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub bot_token: String,
}

/// Login response from the auth service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub account_id: AccountId,
    #[serde(default)]
    pub bot_username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Response from `GET /api/v1/auth/me`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub account_id: AccountId,
    #[serde(default)]
    pub bot_username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub expires_at: i64,
}

impl LoginResponse {
    pub(crate) fn split(self) -> (String, User, AuthCredentials) {
        let credentials = AuthCredentials {
            account_id: self.account_id.clone(),
            expires_at: parse_expires_at(self.expires_at),
        };
        let user = User {
            account_id: self.account_id,
            bot_username: self.bot_username,
            display_name: self.display_name,
        };
        (self.token, user, credentials)
    }
}

impl MeResponse {
    pub(crate) fn split(self) -> (User, AuthCredentials) {
        let credentials = AuthCredentials {
            account_id: self.account_id.clone(),
            expires_at: parse_expires_at(self.expires_at),
        };
        let user = User {
            account_id: self.account_id,
            bot_username: self.bot_username,
            display_name: self.display_name,
        };
        (user, credentials)
    }
}

fn parse_expires_at(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_session() {
        assert_eq!(
            StaticSession::new("abc").bearer_token().await.as_deref(),
            Some("abc")
        );
        assert!(StaticSession::anonymous().bearer_token().await.is_none());
    }

    #[test]
    fn test_static_session_debug_redacts_token() {
        let debug = format!("{:?}", StaticSession::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_login_response_split() {
        let json = r#"{"token":"t0k","accountId":7,"botUsername":"prize_bot","expiresAt":1893456000}"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        let (token, user, creds) = resp.split();
        assert_eq!(token, "t0k");
        assert_eq!(user.account_id.as_str(), "7");
        assert_eq!(user.bot_username.as_deref(), Some("prize_bot"));
        assert!(creds.is_authenticated());
    }

    #[test]
    fn test_expired_credentials() {
        let creds = AuthCredentials {
            account_id: AccountId::from("1"),
            expires_at: parse_expires_at(1_000),
        };
        assert!(!creds.is_authenticated());
    }
}
