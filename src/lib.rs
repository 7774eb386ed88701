//! # Giveaway SDK
//!
//! Real-time sync layer for a Telegram giveaway dashboard: the active
//! giveaway state, its live participant feed, and the finish workflow.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Newtypes, domain models, the giveaway store and finish workflow
//! 2. **Auth**: Bot-token login and the session store read by the live handshake
//! 3. **HTTP API**: `GiveawayHttp` with per-endpoint retry policies
//! 4. **WebSocket**: Connection manager, message router, reconnect policy;
//!    `tokio-tungstenite` transport behind the `ws-native` feature
//! 5. **High-Level Client**: `GiveawayClient` with nested sub-clients and the
//!    `LiveGiveaway` session
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use giveaway_sdk::prelude::*;
//!
//! let client = GiveawayClient::builder()
//!     .api_url("https://api.giveaway.example")
//!     .build()?;
//!
//! let user = client.auth().login(&bot_token).await?;
//! let live = client.live(user.account_id);
//! live.load().await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: credentials, login/logout, session store.
pub mod auth;

// ── Layer 3: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// Live updates: messages, routing, reconnection, connection manager.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `GiveawayClient`: the primary entry point.
#[cfg(feature = "http")]
pub mod client;

/// `LiveGiveaway`: one account's live session.
pub mod live;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{AccountId, GiveawayId};

    // Domain types (giveaway)
    pub use crate::domain::giveaway::wire::CreateGiveawayRequest;
    pub use crate::domain::giveaway::{
        ActiveGiveaway, FinishCoordinator, FinishMessages, FinishPhase, GiveawayBackend,
        GiveawayStatus, GiveawayStore, SnapshotSource, Winner,
    };

    // Domain types (participant)
    pub use crate::domain::participant::{Participant, ParticipantPage};

    // Errors
    pub use crate::error::{SdkError, WorkflowError};

    // Network
    pub use crate::network::{ServiceUrls, DEFAULT_API_URL, DEFAULT_WS_URL};

    // Auth types
    pub use crate::auth::{AuthCredentials, SessionStore, StaticSession, User};

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AuthClient, GiveawayClient, GiveawayClientBuilder, GiveawaysClient, ParticipantsClient,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
    pub use crate::live::LiveGiveaway;

    // WebSocket types
    pub use crate::ws::{
        ConnectionManager, ConnectionState, Connector, Frame, Link, RealTimeEvent,
        ReconnectPolicy, WsConfig,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::TungsteniteConnector;
}
