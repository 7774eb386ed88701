//! Participant domain: who joined a giveaway.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wire::{ParticipantResponse, ParticipantsResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Participant {
    /// `@username` when known, otherwise the first name, otherwise the id.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(username), _) => format!("@{}", username),
            (None, Some(first_name)) => first_name.clone(),
            (None, None) => self.user_id.clone(),
        }
    }
}

impl From<ParticipantResponse> for Participant {
    fn from(p: ParticipantResponse) -> Self {
        Self {
            user_id: p.user_id,
            username: p.username,
            first_name: p.first_name,
            joined_at: p.joined_at,
        }
    }
}

/// One page of a giveaway's participant list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantPage {
    pub participants: Vec<Participant>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl ParticipantPage {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

impl From<ParticipantsResponse> for ParticipantPage {
    fn from(resp: ParticipantsResponse) -> Self {
        let limit = if resp.limit == 0 {
            resp.participants.len() as u32
        } else {
            resp.limit
        };
        Self {
            participants: resp.participants.into_iter().map(Participant::from).collect(),
            total: resp.total,
            page: resp.page,
            limit,
        }
    }
}
