//! Wire types for participant-service responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::serde_util::{flexible_timestamp, string_or_number};
use crate::shared::GiveawayId;

/// A single participant from the REST API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default, with = "flexible_timestamp")]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Response of `GET /api/v1/participants`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsResponse {
    #[serde(default)]
    pub participants: Vec<ParticipantResponse>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

/// Response of `GET /api/v1/participants/count`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCountResponse {
    pub giveaway_id: GiveawayId,
    #[serde(alias = "participantCount")]
    pub count: u64,
}
