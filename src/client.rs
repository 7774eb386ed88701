//! High-level client: `GiveawayClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the shared state, and accessor methods.

use crate::auth::client::Auth;
use crate::auth::{AuthCredentials, SessionStore};
use crate::domain::giveaway::client::Giveaways;
use crate::domain::giveaway::GiveawayStore;
use crate::domain::participant::client::Participants;
use crate::error::SdkError;
use crate::http::GiveawayHttp;
use crate::live::LiveGiveaway;
use crate::network::ServiceUrls;
use crate::shared::AccountId;
use crate::ws::transport::Connector;
use crate::ws::{ReconnectPolicy, WsConfig};

use async_lock::RwLock;
use std::sync::Arc;
use std::time::Duration;

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::giveaway::client::Giveaways as GiveawaysClient;
pub use crate::domain::participant::client::Participants as ParticipantsClient;

/// The primary entry point for the giveaway SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.auth()`, `client.giveaways()`, `client.participants()`.
/// All clones share the HTTP session and the [`GiveawayStore`].
pub struct GiveawayClient {
    pub(crate) http: GiveawayHttp,
    pub(crate) ws_config: WsConfig,
    pub(crate) auth_credentials: Arc<RwLock<Option<AuthCredentials>>>,
    pub(crate) store: GiveawayStore,
}

impl GiveawayClient {
    pub fn builder() -> GiveawayClientBuilder {
        GiveawayClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn giveaways(&self) -> Giveaways<'_> {
        Giveaways { client: self }
    }

    pub fn participants(&self) -> Participants<'_> {
        Participants { client: self }
    }

    // ── Shared state ─────────────────────────────────────────────────────

    /// The active-giveaway store shared by every sub-client and live session.
    pub fn store(&self) -> &GiveawayStore {
        &self.store
    }

    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// Read-only view of the session token, for custom transports.
    pub fn session(&self) -> Arc<dyn SessionStore> {
        Arc::new(self.http.clone())
    }

    // ── Live updates ─────────────────────────────────────────────────────

    /// Start a live session for `account_id` over `tokio-tungstenite`.
    ///
    /// Must be called inside a tokio runtime.
    #[cfg(feature = "ws-native")]
    pub fn live(&self, account_id: AccountId) -> LiveGiveaway {
        let connector =
            crate::ws::native::TungsteniteConnector::new(self.ws_config.connect_timeout);
        self.live_with(account_id, connector)
    }

    /// Start a live session over a caller-provided transport.
    pub fn live_with<C: Connector>(&self, account_id: AccountId, connector: C) -> LiveGiveaway {
        LiveGiveaway::new(
            Arc::new(self.clone()),
            self.store.clone(),
            self.ws_config.clone(),
            self.session(),
            account_id,
            connector,
        )
    }
}

impl Clone for GiveawayClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            ws_config: self.ws_config.clone(),
            auth_credentials: self.auth_credentials.clone(),
            store: self.store.clone(),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct GiveawayClientBuilder {
    urls: ServiceUrls,
    ws: WsConfig,
    auth_credentials: Option<AuthCredentials>,
}

impl Default for GiveawayClientBuilder {
    fn default() -> Self {
        Self {
            urls: ServiceUrls::default(),
            ws: WsConfig::default(),
            auth_credentials: None,
        }
    }
}

impl GiveawayClientBuilder {
    /// Defaults overridden by `GIVEAWAY_*` environment variables.
    ///
    /// Reads `GIVEAWAY_AUTH_URL`, `GIVEAWAY_API_URL`, `GIVEAWAY_PARTICIPANT_URL`,
    /// `GIVEAWAY_WS_URL` and `GIVEAWAY_WS_MAX_RECONNECTS`.
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SdkError> {
        let mut builder = Self::default();
        if let Some(url) = lookup("GIVEAWAY_AUTH_URL") {
            builder = builder.auth_url(&url);
        }
        if let Some(url) = lookup("GIVEAWAY_API_URL") {
            builder = builder.api_url(&url);
        }
        if let Some(url) = lookup("GIVEAWAY_PARTICIPANT_URL") {
            builder = builder.participant_url(&url);
        }
        if let Some(url) = lookup("GIVEAWAY_WS_URL") {
            builder = builder.ws_url(&url);
        }
        if let Some(raw) = lookup("GIVEAWAY_WS_MAX_RECONNECTS") {
            let max = raw.trim().parse::<u32>().map_err(|_| {
                SdkError::Validation(format!("GIVEAWAY_WS_MAX_RECONNECTS is not a number: {}", raw))
            })?;
            builder = builder.max_reconnect_attempts(max);
        }
        Ok(builder)
    }

    pub fn auth_url(mut self, url: &str) -> Self {
        self.urls.auth = url.to_string();
        self
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.urls.giveaway = url.to_string();
        self
    }

    pub fn participant_url(mut self, url: &str) -> Self {
        self.urls.participant = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws.url = url.to_string();
        self
    }

    /// Open the live channel as soon as an active giveaway is loaded (default: on).
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.ws.auto_connect = enabled;
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.ws.reconnect = policy;
        self
    }

    pub fn max_reconnect_attempts(mut self, max: u32) -> Self {
        self.ws.reconnect.max_attempts = max;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.ws.connect_timeout = timeout;
        self
    }

    /// Pre-set authentication credentials on construction.
    pub fn auth(mut self, credentials: AuthCredentials) -> Self {
        self.auth_credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Result<GiveawayClient, SdkError> {
        if self.ws.url.trim().is_empty() {
            return Err(SdkError::Validation("WebSocket URL is empty".to_string()));
        }

        Ok(GiveawayClient {
            http: GiveawayHttp::new(self.urls)?,
            ws_config: self.ws,
            auth_credentials: Arc::new(RwLock::new(self.auth_credentials)),
            store: GiveawayStore::new(),
        })
    }
}
