//! Live giveaway session: the dashboard-facing surface.
//!
//! Ties the shared [`GiveawayStore`], the [`FinishCoordinator`] and a
//! [`ConnectionManager`] together for one account.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::SessionStore;
use crate::domain::giveaway::{
    AccountSnapshots, ActiveGiveaway, FinishCoordinator, FinishMessages, FinishPhase,
    GiveawayBackend, GiveawayStore, Winner,
};
use crate::error::{SdkError, WorkflowError};
use crate::shared::AccountId;
use crate::ws::transport::Connector;
use crate::ws::{ConnectionManager, ConnectionState, WsConfig};

/// One account's live view of its active giveaway.
///
/// ```rust,ignore
/// let live = client.live(account_id);
/// live.load().await?;                      // fetch snapshot, opens the channel
/// let mut status = live.subscribe_connection_status();
/// live.persist_messages(messages).await?;  // then
/// let winners = live.finish().await?;      // channel closes once the store clears
/// ```
pub struct LiveGiveaway {
    backend: Arc<dyn GiveawayBackend>,
    store: GiveawayStore,
    account_id: AccountId,
    coordinator: FinishCoordinator,
    manager: ConnectionManager,
}

impl LiveGiveaway {
    /// Wire a live session from its collaborators.
    ///
    /// `GiveawayClient::live` is the usual entry point; this
    /// constructor takes any backend and transport. Must be called inside a
    /// tokio runtime.
    pub fn new<C: Connector>(
        backend: Arc<dyn GiveawayBackend>,
        store: GiveawayStore,
        config: WsConfig,
        session: Arc<dyn SessionStore>,
        account_id: AccountId,
        connector: C,
    ) -> Self {
        let coordinator = FinishCoordinator::new(backend.clone(), store.clone());
        let snapshots = Arc::new(AccountSnapshots::new(backend.clone(), account_id.clone()));
        let manager = ConnectionManager::spawn(config, connector, store.clone(), session, snapshots);

        Self {
            backend,
            store,
            account_id,
            coordinator,
            manager,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Fetch the account's active giveaway into the store.
    ///
    /// With `auto_connect` the live channel opens as soon as an active
    /// giveaway lands in the store.
    pub async fn load(&self) -> Result<Option<ActiveGiveaway>, SdkError> {
        let snapshot = self.backend.fetch_active_giveaway(&self.account_id).await?;
        match &snapshot {
            Some(g) => self.store.set_active_giveaway(g.clone()),
            None => self.store.clear_active_giveaway(),
        }
        Ok(snapshot)
    }

    // ── Observation ──────────────────────────────────────────────────────

    pub fn active_giveaway(&self) -> Option<ActiveGiveaway> {
        self.store.snapshot()
    }

    pub fn subscribe_active_giveaway(&self) -> watch::Receiver<Option<ActiveGiveaway>> {
        self.store.subscribe()
    }

    pub fn connection_status(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn subscribe_connection_status(&self) -> watch::Receiver<ConnectionState> {
        self.manager.subscribe()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.manager.reconnect_attempts()
    }

    pub fn finish_phase(&self) -> FinishPhase {
        self.coordinator.phase()
    }

    pub fn subscribe_finish_phase(&self) -> watch::Receiver<FinishPhase> {
        self.coordinator.subscribe()
    }

    // ── Finish workflow ──────────────────────────────────────────────────

    pub async fn persist_messages(&self, messages: FinishMessages) -> Result<(), WorkflowError> {
        self.coordinator.persist_messages(messages).await
    }

    pub async fn finish(&self) -> Result<Vec<Winner>, WorkflowError> {
        self.coordinator.finish().await
    }

    /// Drop the active giveaway locally; the live channel closes with it.
    pub fn clear(&self) {
        self.coordinator.clear();
    }

    // ── Connection control ───────────────────────────────────────────────

    /// Manual (re)connect; the only way out of `ConnectionState::Error`.
    pub fn reconnect(&self) {
        self.manager.connect();
    }

    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    /// Close the live channel and stop its task.
    pub async fn shutdown(self) {
        self.manager.shutdown().await;
    }
}
