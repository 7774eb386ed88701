//! Routes decoded live events to the giveaway store.

use crate::domain::giveaway::GiveawayStore;
use crate::shared::GiveawayId;

use super::RealTimeEvent;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The store took the new participant count.
    CountApplied(u64),
    /// Valid count that did not move the store (equal, lower, or not active).
    CountIgnored(u64),
    /// The server finished the giveaway; the caller should re-fetch it.
    RefreshRequested(GiveawayId),
    /// Event for a giveaway other than the tracked one.
    Stale(GiveawayId),
    /// Nothing tracked; every event is dropped.
    NoActiveGiveaway,
    /// Payload failed to decode. Never fatal to the connection.
    Malformed(String),
}

/// Stateless dispatcher from raw frames to [`GiveawayStore`] updates.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    store: GiveawayStore,
}

impl MessageRouter {
    pub fn new(store: GiveawayStore) -> Self {
        Self { store }
    }

    /// Decode and apply one text frame.
    pub fn route(&self, raw: &str) -> RouteOutcome {
        match RealTimeEvent::decode(raw) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                tracing::warn!(
                    "Dropping malformed live event: {} (raw: {})",
                    e,
                    log_excerpt(raw)
                );
                RouteOutcome::Malformed(e.to_string())
            }
        }
    }

    /// Apply an already decoded event.
    pub fn dispatch(&self, event: RealTimeEvent) -> RouteOutcome {
        let Some(active_id) = self.store.active_id() else {
            tracing::trace!(giveaway_id = %event.giveaway_id(), "No active giveaway, event dropped");
            return RouteOutcome::NoActiveGiveaway;
        };
        if event.giveaway_id() != &active_id {
            tracing::trace!(
                giveaway_id = %event.giveaway_id(),
                active = %active_id,
                "Event for another giveaway dropped"
            );
            return RouteOutcome::Stale(event.giveaway_id().clone());
        }

        match event {
            RealTimeEvent::ParticipantJoined { count, .. }
            | RealTimeEvent::ParticipantCountUpdated { count, .. } => {
                if self.store.update_participant_count(count) {
                    RouteOutcome::CountApplied(count)
                } else {
                    RouteOutcome::CountIgnored(count)
                }
            }
            RealTimeEvent::GiveawayFinished { giveaway_id, .. } => {
                tracing::info!(giveaway_id = %giveaway_id, "Server reported giveaway finished");
                RouteOutcome::RefreshRequested(giveaway_id)
            }
        }
    }
}

const LOG_EXCERPT_BYTES: usize = 256;

/// First `LOG_EXCERPT_BYTES` of a payload, cut on a char boundary.
fn log_excerpt(raw: &str) -> &str {
    if raw.len() <= LOG_EXCERPT_BYTES {
        return raw;
    }
    let mut end = LOG_EXCERPT_BYTES;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
