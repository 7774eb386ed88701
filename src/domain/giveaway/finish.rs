//! Finish workflow: persist messages, finish on the server, then tear down locally.
//!
//! The two server calls are separate, non-atomic operations:
//!
//! ```text
//! Idle ──persist_messages──▶ PersistingMessages ──ok──▶ Idle (messages_ready = true)
//!                                              └─err─▶ MessagePersistFailed
//! Idle ──finish (ready)────▶ Finishing ──ok──▶ Finished (mark_finished, then clear)
//!                                     └─err─▶ FinishFailed (messages stay ready)
//! ```
//!
//! The failed phases stay visible to subscribers until the next step starts.
//! They accept the same calls as `Idle`.
//!
//! At most one workflow step runs at a time. The guard is a state check, not a
//! lock: a second caller gets [`WorkflowError::Busy`] immediately.

use std::sync::Arc;

use tokio::sync::watch;

use super::{ActiveGiveaway, FinishMessages, GiveawayBackend, GiveawayStatus, GiveawayStore, Winner};
use crate::error::WorkflowError;

/// Observable phase of the finish workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishPhase {
    #[default]
    Idle,
    PersistingMessages,
    Finishing,
    Finished,
    MessagePersistFailed,
    FinishFailed,
}

impl FinishPhase {
    /// Whether a server call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::PersistingMessages | Self::Finishing)
    }
}

/// Drives the finish workflow for whichever giveaway the store tracks.
#[derive(Clone)]
pub struct FinishCoordinator {
    backend: Arc<dyn GiveawayBackend>,
    store: GiveawayStore,
    phase: Arc<watch::Sender<FinishPhase>>,
}

impl FinishCoordinator {
    pub fn new(backend: Arc<dyn GiveawayBackend>, store: GiveawayStore) -> Self {
        let (phase, _rx) = watch::channel(FinishPhase::Idle);
        Self {
            backend,
            store,
            phase: Arc::new(phase),
        }
    }

    pub fn phase(&self) -> FinishPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FinishPhase> {
        self.phase.subscribe()
    }

    pub fn store(&self) -> &GiveawayStore {
        &self.store
    }

    /// Persist the conclusion / winner / loser texts for the active giveaway.
    ///
    /// `messages_ready` flips to true only after the server confirms. On
    /// failure nothing is marked ready and the collaborator's reason is returned.
    pub async fn persist_messages(&self, messages: FinishMessages) -> Result<(), WorkflowError> {
        let (guard, giveaway) = self.begin(FinishPhase::PersistingMessages, false)?;
        tracing::info!(giveaway_id = %giveaway.id, "Persisting finish messages");

        match self
            .backend
            .persist_finish_messages(&giveaway.id, &messages)
            .await
        {
            Ok(()) => {
                self.store.set_messages_ready_for(&giveaway.id, true);
                guard.settle(FinishPhase::Idle);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(giveaway_id = %giveaway.id, "Persisting finish messages failed: {}", reason);
                guard.fail(FinishPhase::MessagePersistFailed);
                Err(WorkflowError::PersistFailed { reason })
            }
        }
    }

    /// Finish the active giveaway on the server and return the drawn winners.
    ///
    /// Requires `messages_ready`. The local aggregate is marked finished and
    /// cleared only after the server confirmed; a failed finish leaves it
    /// untouched and `finish()` can simply be retried.
    pub async fn finish(&self) -> Result<Vec<Winner>, WorkflowError> {
        let (guard, giveaway) = self.begin(FinishPhase::Finishing, true)?;
        tracing::info!(giveaway_id = %giveaway.id, "Finishing giveaway");

        match self.backend.finish_giveaway(&giveaway.id).await {
            Ok(winners) => {
                self.store.mark_finished_for(&giveaway.id);
                self.store.clear_if_current(&giveaway.id);
                guard.settle(FinishPhase::Finished);
                tracing::info!(
                    giveaway_id = %giveaway.id,
                    winners = winners.len(),
                    "Giveaway finished"
                );
                Ok(winners)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(giveaway_id = %giveaway.id, "Finishing giveaway failed: {}", reason);
                guard.fail(FinishPhase::FinishFailed);
                Err(WorkflowError::FinishFailed { reason })
            }
        }
    }

    /// Drop the active giveaway locally (e.g. the user dismissed it).
    pub fn clear(&self) {
        self.store.clear_active_giveaway();
        self.phase.send_if_modified(|phase| {
            if !phase.is_busy() && *phase != FinishPhase::Idle {
                *phase = FinishPhase::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Atomically check eligibility and enter `next`.
    fn begin(
        &self,
        next: FinishPhase,
        require_ready: bool,
    ) -> Result<(PhaseGuard<'_>, ActiveGiveaway), WorkflowError> {
        let mut outcome = Err(WorkflowError::Busy);
        self.phase.send_if_modified(|phase| {
            if phase.is_busy() {
                return false;
            }
            outcome = eligible(self.store.snapshot(), require_ready);
            if outcome.is_ok() {
                *phase = next;
                true
            } else {
                false
            }
        });

        if matches!(outcome, Err(WorkflowError::Busy)) {
            tracing::debug!("Finish workflow busy, rejecting {:?}", next);
        }

        outcome.map(|giveaway| {
            (
                PhaseGuard {
                    phase: &self.phase,
                    settled: false,
                },
                giveaway,
            )
        })
    }
}

fn eligible(
    snapshot: Option<ActiveGiveaway>,
    require_ready: bool,
) -> Result<ActiveGiveaway, WorkflowError> {
    let giveaway = snapshot.ok_or(WorkflowError::NoActiveGiveaway)?;
    if giveaway.status != GiveawayStatus::Active {
        return Err(WorkflowError::NotActive(giveaway.id.to_string()));
    }
    if require_ready && !giveaway.messages_ready {
        return Err(WorkflowError::MessagesNotReady);
    }
    Ok(giveaway)
}

/// Returns the workflow to `Idle` if the step future is dropped mid-flight.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<FinishPhase>,
    settled: bool,
}

impl PhaseGuard<'_> {
    fn settle(mut self, terminal: FinishPhase) {
        self.phase.send_replace(terminal);
        self.settled = true;
    }

    /// Publish the failure state; it is left behind by the next `begin`.
    fn fail(mut self, failed: FinishPhase) {
        self.phase.send_replace(failed);
        self.settled = true;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.phase.send_replace(FinishPhase::Idle);
        }
    }
}
