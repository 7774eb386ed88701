//! Active giveaway state container: the single writable copy of the aggregate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{ActiveGiveaway, GiveawayStatus};
use crate::shared::GiveawayId;

/// Holds the account's active giveaway and broadcasts every change.
///
/// Cheap to clone; clones share the same state. All writers go through the
/// operations below, and every operation is synchronous, so a mutation is
/// never split across an await point. Subscribers observe whole snapshots only.
#[derive(Debug, Clone)]
pub struct GiveawayStore {
    tx: Arc<watch::Sender<Option<ActiveGiveaway>>>,
}

impl GiveawayStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot of the aggregate.
    pub fn snapshot(&self) -> Option<ActiveGiveaway> {
        self.tx.borrow().clone()
    }

    /// Id of the tracked giveaway, if any.
    pub fn active_id(&self) -> Option<GiveawayId> {
        self.tx.borrow().as_ref().map(|g| g.id.clone())
    }

    /// Receive every subsequent change of the aggregate.
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveGiveaway>> {
        self.tx.subscribe()
    }

    /// Replace the aggregate wholesale (after a fetch or a create).
    ///
    /// Overwrites any counts applied from live events.
    pub fn set_active_giveaway(&self, snapshot: ActiveGiveaway) {
        tracing::debug!(
            giveaway_id = %snapshot.id,
            status = %snapshot.status,
            participants = snapshot.participant_count,
            "Active giveaway replaced"
        );
        self.tx.send_replace(Some(snapshot));
    }

    /// Apply an absolute participant count.
    ///
    /// Counts only move forward while the giveaway is active; a lower value is
    /// a stale or reordered delivery and is dropped. Returns whether the count
    /// changed.
    pub fn update_participant_count(&self, count: u64) -> bool {
        self.tx.send_if_modified(|slot| match slot {
            Some(g) if g.status == GiveawayStatus::Active => {
                if count > g.participant_count {
                    g.participant_count = count;
                    true
                } else {
                    if count < g.participant_count {
                        tracing::debug!(
                            giveaway_id = %g.id,
                            current = g.participant_count,
                            received = count,
                            "Ignoring stale participant count"
                        );
                    }
                    false
                }
            }
            _ => false,
        })
    }

    /// Mirror the server's "messages saved" flag on the tracked giveaway.
    ///
    /// Callers pass `true` only after a confirmed persist round-trip.
    pub fn set_messages_ready(&self, ready: bool) -> bool {
        self.tx.send_if_modified(|slot| set_ready(slot, None, ready))
    }

    /// [`Self::set_messages_ready`] restricted to a specific giveaway.
    pub(crate) fn set_messages_ready_for(&self, id: &GiveawayId, ready: bool) -> bool {
        self.tx.send_if_modified(|slot| set_ready(slot, Some(id), ready))
    }

    /// Transition the tracked giveaway to `Finished`, stamping `finished_at`.
    ///
    /// Only the finish workflow calls this, after the server confirmed the
    /// finish. Returns the stamp, or `None` if nothing active was tracked.
    pub fn mark_finished(&self) -> Option<DateTime<Utc>> {
        self.finish_matching(None)
    }

    pub(crate) fn mark_finished_for(&self, id: &GiveawayId) -> Option<DateTime<Utc>> {
        self.finish_matching(Some(id))
    }

    fn finish_matching(&self, id: Option<&GiveawayId>) -> Option<DateTime<Utc>> {
        let mut stamped = None;
        self.tx.send_if_modified(|slot| match slot {
            Some(g) if g.status == GiveawayStatus::Active && id.map_or(true, |id| &g.id == id) => {
                let now = Utc::now();
                g.status = GiveawayStatus::Finished;
                g.finished_at = Some(now);
                stamped = Some(now);
                true
            }
            _ => false,
        });
        stamped
    }

    /// Drop the aggregate. Observers (the connection manager) tear down on this.
    pub fn clear_active_giveaway(&self) {
        let cleared = self.tx.send_if_modified(|slot| slot.take().is_some());
        if cleared {
            tracing::debug!("Active giveaway cleared");
        }
    }

    /// Clear only if `id` is still the tracked giveaway.
    pub(crate) fn clear_if_current(&self, id: &GiveawayId) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.as_ref().map_or(false, |g| &g.id == id) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }

    /// Apply a snapshot fetched in response to a live event for `expected`.
    ///
    /// Ignored when the store moved on to a different giveaway while the fetch
    /// was in flight. `None` from the server clears the aggregate.
    pub fn apply_refresh(&self, expected: &GiveawayId, fetched: Option<ActiveGiveaway>) -> bool {
        self.tx.send_if_modified(|slot| {
            let still_current = slot.as_ref().map_or(false, |g| &g.id == expected);
            if !still_current {
                tracing::debug!(giveaway_id = %expected, "Discarding refresh for superseded giveaway");
                return false;
            }
            *slot = fetched;
            true
        })
    }
}

impl Default for GiveawayStore {
    fn default() -> Self {
        Self::new()
    }
}

fn set_ready(slot: &mut Option<ActiveGiveaway>, id: Option<&GiveawayId>, ready: bool) -> bool {
    match slot {
        Some(g)
            if g.status == GiveawayStatus::Active
                && g.messages_ready != ready
                && id.map_or(true, |id| &g.id == id) =>
        {
            g.messages_ready = ready;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn giveaway(id: u64, count: u64) -> ActiveGiveaway {
        let mut g = ActiveGiveaway::new(GiveawayId::from(id), "Test", Utc::now());
        g.participant_count = count;
        g
    }

    #[test]
    fn test_set_active_giveaway_replaces() {
        let store = GiveawayStore::new();
        assert!(store.snapshot().is_none());

        store.set_active_giveaway(giveaway(42, 10));
        assert_eq!(store.active_id(), Some(GiveawayId::from("42")));
        assert_eq!(store.snapshot().unwrap().participant_count, 10);

        store.update_participant_count(20);
        store.set_active_giveaway(giveaway(42, 12));
        assert_eq!(store.snapshot().unwrap().participant_count, 12);
    }

    #[test]
    fn test_non_decreasing_counts_end_at_last_value() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 0));

        for count in [1, 1, 3, 3, 8, 13, 13, 21] {
            store.update_participant_count(count);
        }
        assert_eq!(store.snapshot().unwrap().participant_count, 21);
    }

    #[test]
    fn test_count_never_decreases() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 10));

        assert!(store.update_participant_count(15));
        assert!(!store.update_participant_count(12));
        assert_eq!(store.snapshot().unwrap().participant_count, 15);
    }

    #[test]
    fn test_count_ignored_without_active_giveaway() {
        let store = GiveawayStore::new();
        assert!(!store.update_participant_count(5));

        store.set_active_giveaway(giveaway(1, 10));
        store.mark_finished();
        assert!(!store.update_participant_count(50));
        assert_eq!(store.snapshot().unwrap().participant_count, 10);
    }

    #[test]
    fn test_mark_finished_stamps_once() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 0));

        let stamp = store.mark_finished().unwrap();
        let g = store.snapshot().unwrap();
        assert_eq!(g.status, GiveawayStatus::Finished);
        assert_eq!(g.finished_at, Some(stamp));

        assert!(store.mark_finished().is_none());
        assert_eq!(store.snapshot().unwrap().finished_at, Some(stamp));
    }

    #[test]
    fn test_mark_finished_for_other_id_is_noop() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 0));
        assert!(store.mark_finished_for(&GiveawayId::from("2")).is_none());
        assert!(store.snapshot().unwrap().is_active());
    }

    #[test]
    fn test_messages_ready_flag() {
        let store = GiveawayStore::new();
        assert!(!store.set_messages_ready(true));

        store.set_active_giveaway(giveaway(1, 0));
        assert!(store.set_messages_ready(true));
        assert!(store.snapshot().unwrap().messages_ready);
        assert!(!store.set_messages_ready_for(&GiveawayId::from("9"), false));
        assert!(store.snapshot().unwrap().messages_ready);
    }

    #[test]
    fn test_clear_notifies_subscribers() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 0));
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.clear_active_giveaway();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());

        // Clearing an empty store is silent.
        store.clear_active_giveaway();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clear_if_current() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(1, 0));
        assert!(!store.clear_if_current(&GiveawayId::from("2")));
        assert!(store.clear_if_current(&GiveawayId::from("1")));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_apply_refresh_only_for_current_giveaway() {
        let store = GiveawayStore::new();
        store.set_active_giveaway(giveaway(2, 5));

        assert!(!store.apply_refresh(&GiveawayId::from("1"), None));
        assert_eq!(store.active_id(), Some(GiveawayId::from("2")));

        let mut finished = giveaway(2, 9);
        finished.status = GiveawayStatus::Finished;
        finished.finished_at = Some(Utc::now());
        assert!(store.apply_refresh(&GiveawayId::from("2"), Some(finished)));
        assert_eq!(store.snapshot().unwrap().status, GiveawayStatus::Finished);

        assert!(store.apply_refresh(&GiveawayId::from("2"), None));
        assert!(store.snapshot().is_none());
    }
}
