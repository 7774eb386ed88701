//! Auth sub-client: bot-token login, session check, logout.

use crate::auth::{AuthCredentials, LoginRequest, User};
use crate::client::GiveawayClient;
use crate::error::{AuthError, HttpError, SdkError};

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a GiveawayClient,
}

impl<'a> Auth<'a> {
    /// Log in with the dashboard's Telegram bot token.
    ///
    /// Stores the returned bearer token inside the HTTP client; it is sent on
    /// every later request and in the live-updates handshake.
    pub async fn login(&self, bot_token: &str) -> Result<User, SdkError> {
        if bot_token.trim().is_empty() {
            return Err(SdkError::Validation("bot token is empty".to_string()));
        }

        let request = LoginRequest {
            bot_token: bot_token.to_string(),
        };
        let resp = match self.client.http.login(&request).await {
            Ok(resp) => resp,
            Err(HttpError::Unauthorized) | Err(HttpError::BadRequest(_)) => {
                return Err(AuthError::LoginFailed("bot token rejected".to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        let (token, user, credentials) = resp.split();
        self.client.http.set_auth_token(Some(token)).await;
        *self.client.auth_credentials.write().await = Some(credentials);
        tracing::info!(account_id = %user.account_id, "Logged in");

        Ok(user)
    }

    /// Validate the current session against `GET /api/v1/auth/me`.
    ///
    /// On failure (no token, 401, expired) the cached credentials are cleared.
    pub async fn check_session(&self) -> Result<User, SdkError> {
        if !self.client.http.has_auth_token().await {
            *self.client.auth_credentials.write().await = None;
            return Err(AuthError::NotAuthenticated.into());
        }

        let me = match self.client.http.me().await {
            Ok(me) => me,
            Err(e) => {
                *self.client.auth_credentials.write().await = None;
                return Err(match e {
                    HttpError::Unauthorized => AuthError::TokenExpired.into(),
                    other => other.into(),
                });
            }
        };

        let (user, credentials) = me.split();
        *self.client.auth_credentials.write().await = Some(credentials);
        Ok(user)
    }

    /// Logout is best-effort: server call, then drop the token, the cached
    /// credentials and the tracked giveaway.
    pub async fn logout(&self) -> Result<(), SdkError> {
        if let Err(e) = self.client.http.logout().await {
            tracing::debug!("Logout request failed: {}", e);
        }

        self.client.http.clear_auth_token().await;
        *self.client.auth_credentials.write().await = None;
        self.client.store.clear_active_giveaway();

        Ok(())
    }

    /// Get current auth credentials (if authenticated).
    pub async fn credentials(&self) -> Option<AuthCredentials> {
        self.client.auth_credentials.read().await.clone()
    }

    /// Check if currently authenticated (based on cached credentials).
    ///
    /// For a server-validated check, use `check_session()` instead.
    pub async fn is_authenticated(&self) -> bool {
        self.client
            .auth_credentials
            .read()
            .await
            .as_ref()
            .map(|c| c.is_authenticated())
            .unwrap_or(false)
    }
}
