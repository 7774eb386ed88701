//! WebSocket layer: live participant feed for the active giveaway.
//!
//! - [`manager`]: background task owning the single live channel
//! - [`router`]: decodes envelopes and applies them to the giveaway store
//! - [`backoff`]: reconnect delay policy and cancellable timer
//! - [`transport`]: connector seam; `ws-native` provides `tokio-tungstenite` (native.rs)
//!
//! This module defines the shared message/state types.

pub mod backoff;
pub mod manager;
pub mod router;
pub mod transport;

#[cfg(feature = "ws-native")]
pub mod native;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WsError;
use crate::shared::serde_util::flexible_timestamp;
use crate::shared::GiveawayId;

pub use backoff::{ReconnectPolicy, ReconnectTimer};
pub use manager::ConnectionManager;
pub use router::{MessageRouter, RouteOutcome};
pub use transport::{Connector, Frame, Link};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MessageOut {
    /// Handshake sent right after the channel opens.
    #[serde(rename = "auth")]
    Auth { token: String },
}

impl MessageOut {
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth {
            token: token.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::ProtocolError(e.to_string()))
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound envelope: `{type, giveawayId, data, timestamp}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIn {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub giveaway_id: GiveawayId,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, with = "flexible_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The type of inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ParticipantJoined,
    ParticipantCountUpdated,
    GiveawayFinished,
}

#[derive(Debug, Clone, Deserialize)]
struct CountData {
    #[serde(alias = "participantCount", alias = "participant_count")]
    count: u64,
}

/// A decoded live event. Transient; consumed once per delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealTimeEvent {
    ParticipantJoined {
        giveaway_id: GiveawayId,
        count: u64,
        timestamp: Option<DateTime<Utc>>,
    },
    ParticipantCountUpdated {
        giveaway_id: GiveawayId,
        count: u64,
        timestamp: Option<DateTime<Utc>>,
    },
    GiveawayFinished {
        giveaway_id: GiveawayId,
        timestamp: Option<DateTime<Utc>>,
    },
}

impl RealTimeEvent {
    pub fn giveaway_id(&self) -> &GiveawayId {
        match self {
            Self::ParticipantJoined { giveaway_id, .. }
            | Self::ParticipantCountUpdated { giveaway_id, .. }
            | Self::GiveawayFinished { giveaway_id, .. } => giveaway_id,
        }
    }

    /// Decode a raw text frame. Either the whole event decodes or nothing does.
    pub fn decode(raw: &str) -> Result<Self, WsError> {
        let msg: MessageIn = serde_json::from_str(raw)
            .map_err(|e| WsError::DeserializationError(e.to_string()))?;
        Self::try_from(msg)
    }
}

impl TryFrom<MessageIn> for RealTimeEvent {
    type Error = WsError;

    fn try_from(msg: MessageIn) -> Result<Self, Self::Error> {
        let count = || {
            serde_json::from_value::<CountData>(msg.data.clone())
                .map(|d| d.count)
                .map_err(|e| {
                    WsError::DeserializationError(format!("{:?} payload: {}", msg.kind, e))
                })
        };

        Ok(match msg.kind {
            EventKind::ParticipantJoined => Self::ParticipantJoined {
                count: count()?,
                giveaway_id: msg.giveaway_id,
                timestamp: msg.timestamp,
            },
            EventKind::ParticipantCountUpdated => Self::ParticipantCountUpdated {
                count: count()?,
                giveaway_id: msg.giveaway_id,
                timestamp: msg.timestamp,
            },
            EventKind::GiveawayFinished => Self::GiveawayFinished {
                giveaway_id: msg.giveaway_id,
                timestamp: msg.timestamp,
            },
        })
    }
}

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle of the live channel, owned by the [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    /// Reconnect attempts exhausted; only a manual `connect()` recovers.
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the live-updates connection.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Base URL; the giveaway id is appended as the last path segment.
    pub url: String,
    /// Open the channel automatically when an active giveaway appears.
    pub auto_connect: bool,
    pub reconnect: ReconnectPolicy,
    pub connect_timeout: Duration,
}

impl WsConfig {
    /// URL of the channel for one giveaway.
    pub fn channel_url(&self, giveaway_id: &GiveawayId) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            urlencoding::encode(giveaway_id.as_str())
        )
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            auto_connect: true,
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_handshake_serialization() {
        let json = MessageOut::auth("secret").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "auth");
        assert_eq!(parsed["token"], "secret");
    }

    #[test]
    fn test_decode_count_update() {
        let raw = r#"{"type":"participant_count_updated","giveawayId":42,"data":{"count":15},"timestamp":1740076800000}"#;
        let event = RealTimeEvent::decode(raw).unwrap();
        match event {
            RealTimeEvent::ParticipantCountUpdated {
                giveaway_id,
                count,
                timestamp,
            } => {
                assert_eq!(giveaway_id.as_str(), "42");
                assert_eq!(count, 15);
                assert!(timestamp.is_some());
            }
            other => panic!("expected ParticipantCountUpdated, got: {other:?}"),
        }
    }

    #[test]
    fn test_decode_joined_with_camel_case_count() {
        let raw = r#"{"type":"participant_joined","giveawayId":"42","data":{"participantCount":11,"user":{"id":5}}}"#;
        let event = RealTimeEvent::decode(raw).unwrap();
        assert!(matches!(
            event,
            RealTimeEvent::ParticipantJoined { count: 11, .. }
        ));
    }

    #[test]
    fn test_decode_finished_without_data() {
        let raw = r#"{"type":"giveaway_finished","giveawayId":42}"#;
        let event = RealTimeEvent::decode(raw).unwrap();
        assert_eq!(event.giveaway_id().as_str(), "42");
        assert!(matches!(event, RealTimeEvent::GiveawayFinished { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_type_and_bad_payloads() {
        for raw in [
            "not json",
            r#"{"type":"participant_left","giveawayId":42,"data":{"count":1}}"#,
            r#"{"type":"participant_count_updated","data":{"count":1}}"#,
            r#"{"type":"participant_count_updated","giveawayId":42,"data":{"count":-3}}"#,
            r#"{"type":"participant_joined","giveawayId":42}"#,
        ] {
            assert!(
                matches!(
                    RealTimeEvent::decode(raw),
                    Err(WsError::DeserializationError(_))
                ),
                "should reject: {raw}"
            );
        }
    }

    #[test]
    fn test_channel_url() {
        let config = WsConfig {
            url: "wss://example.test/ws/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.channel_url(&GiveawayId::from("42")),
            "wss://example.test/ws/42"
        );
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Error.to_string(), "error");
    }
}
