//! Wire types for giveaway-service responses and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::serde_util::{flexible_timestamp, string_or_number};
use crate::shared::GiveawayId;

/// REST representation of a giveaway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GiveawayResponse {
    pub id: GiveawayId,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub participant_count: u64,
    #[serde(default = "default_winners_count")]
    pub winners_count: u32,
    #[serde(default)]
    pub messages_ready: bool,
    #[serde(default, with = "flexible_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
}

fn default_winners_count() -> u32 {
    1
}

/// Response of `GET /api/v1/giveaways/active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveGiveawayResponse {
    pub giveaway: Option<GiveawayResponse>,
}

/// Request body of `POST /api/v1/giveaways`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiveawayRequest {
    pub name: String,
    pub channel_ids: Vec<String>,
    pub winners_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// A winner entry in the finish response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WinnerResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub username: Option<String>,
    #[serde(default)]
    pub place: u32,
}

/// Response of `POST /api/v1/giveaways/{id}/finish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishResponse {
    #[serde(default)]
    pub winners: Vec<WinnerResponse>,
}

/// Request body of `PUT /api/v1/giveaways/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinishMessagesRequest {
    pub conclusion_message: String,
    pub winner_message: String,
    pub loser_message: String,
}

impl From<&super::FinishMessages> for FinishMessagesRequest {
    fn from(messages: &super::FinishMessages) -> Self {
        Self {
            conclusion_message: messages.conclusion.clone(),
            winner_message: messages.winner.clone(),
            loser_message: messages.loser.clone(),
        }
    }
}
