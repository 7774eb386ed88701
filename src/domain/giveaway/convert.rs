//! Conversions from wire types to domain types for giveaways.

use super::wire::{GiveawayResponse, WinnerResponse};
use super::{ActiveGiveaway, GiveawayStatus, Winner};
use crate::error::ConversionError;

impl TryFrom<GiveawayResponse> for ActiveGiveaway {
    type Error = ConversionError;

    fn try_from(g: GiveawayResponse) -> Result<Self, Self::Error> {
        let status = match g.status.to_ascii_lowercase().as_str() {
            "active" => GiveawayStatus::Active,
            "finished" | "completed" => GiveawayStatus::Finished,
            _ => {
                return Err(ConversionError::InvalidValue {
                    field: "status",
                    value: g.status,
                })
            }
        };

        let created_at = g.created_at.ok_or(ConversionError::MissingField("createdAt"))?;

        match (status, g.finished_at) {
            (GiveawayStatus::Finished, None) => {
                return Err(ConversionError::Inconsistent {
                    id: g.id.to_string(),
                    detail: "finished without finishedAt".to_string(),
                })
            }
            (GiveawayStatus::Active, Some(_)) => {
                return Err(ConversionError::Inconsistent {
                    id: g.id.to_string(),
                    detail: "active with finishedAt".to_string(),
                })
            }
            _ => {}
        }

        Ok(Self {
            id: g.id,
            name: g.name,
            status,
            participant_count: g.participant_count,
            winners_count: g.winners_count,
            messages_ready: g.messages_ready,
            created_at,
            finished_at: g.finished_at,
        })
    }
}

impl From<WinnerResponse> for Winner {
    fn from(w: WinnerResponse) -> Self {
        Self {
            user_id: w.user_id,
            username: w.username,
            place: w.place,
        }
    }
}
