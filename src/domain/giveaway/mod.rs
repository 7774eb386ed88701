//! Giveaway domain: the active giveaway aggregate, its store, and the finish workflow.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod finish;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;
pub mod wire;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;
use crate::shared::{AccountId, GiveawayId};

pub use finish::{FinishCoordinator, FinishPhase};
pub use state::GiveawayStore;

/// Lifecycle of a giveaway. Only `Active → Finished` is a valid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiveawayStatus {
    Active,
    Finished,
}

impl GiveawayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for GiveawayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The account's currently running giveaway.
///
/// `finished_at` is `Some` iff `status == Finished`. Wire conversion rejects
/// snapshots that break this, and [`GiveawayStore`] is the only place that
/// performs the transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveGiveaway {
    pub id: GiveawayId,
    pub name: String,
    pub status: GiveawayStatus,
    pub participant_count: u64,
    pub winners_count: u32,
    /// True only after the finish messages were confirmed persisted by the server.
    pub messages_ready: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ActiveGiveaway {
    /// A freshly created, active giveaway with no participants.
    pub fn new(id: GiveawayId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            status: GiveawayStatus::Active,
            participant_count: 0,
            winners_count: 1,
            messages_ready: false,
            created_at,
            finished_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GiveawayStatus::Active
    }
}

/// The three texts posted to the channel when a giveaway ends.
///
/// Always persisted together; the giveaway service has no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishMessages {
    pub conclusion: String,
    pub winner: String,
    pub loser: String,
}

/// A participant drawn as a winner by the finish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub user_id: String,
    pub username: Option<String>,
    pub place: u32,
}

// ─── Collaborator seams ──────────────────────────────────────────────────────

/// Giveaway-service operations the live layer depends on.
///
/// [`crate::client::GiveawayClient`] implements this over HTTP; tests swap in
/// an in-memory backend. Every call resolves to a value or a typed error.
pub trait GiveawayBackend: Send + Sync {
    /// Fetch the account's active giveaway, `None` when there is none.
    fn fetch_active_giveaway<'a>(
        &'a self,
        account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Option<ActiveGiveaway>, SdkError>>;

    fn persist_finish_messages<'a>(
        &'a self,
        giveaway_id: &'a GiveawayId,
        messages: &'a FinishMessages,
    ) -> BoxFuture<'a, Result<(), SdkError>>;

    fn finish_giveaway<'a>(
        &'a self,
        giveaway_id: &'a GiveawayId,
    ) -> BoxFuture<'a, Result<Vec<Winner>, SdkError>>;
}

/// Re-fetches the active giveaway snapshot for a fixed account.
///
/// Used by the connection manager when the server pushes `giveaway_finished`.
pub trait SnapshotSource: Send + Sync {
    fn fetch_snapshot(&self) -> BoxFuture<'_, Result<Option<ActiveGiveaway>, SdkError>>;
}

/// [`SnapshotSource`] bound to one account on top of a [`GiveawayBackend`].
#[derive(Clone)]
pub struct AccountSnapshots {
    backend: Arc<dyn GiveawayBackend>,
    account_id: AccountId,
}

impl AccountSnapshots {
    pub fn new(backend: Arc<dyn GiveawayBackend>, account_id: AccountId) -> Self {
        Self {
            backend,
            account_id,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }
}

impl SnapshotSource for AccountSnapshots {
    fn fetch_snapshot(&self) -> BoxFuture<'_, Result<Option<ActiveGiveaway>, SdkError>> {
        self.backend.fetch_active_giveaway(&self.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;

    #[tokio::test]
    async fn test_account_snapshots_fetch_through_backend() {
        let backend = Arc::new(FakeBackend::default());
        let snapshots = AccountSnapshots::new(backend.clone(), AccountId::from("acct-1"));
        assert_eq!(snapshots.account_id().as_str(), "acct-1");

        assert!(snapshots.fetch_snapshot().await.unwrap().is_none());

        let giveaway = ActiveGiveaway::new(GiveawayId::from(42u64), "Launch", Utc::now());
        backend.set_snapshot(Some(giveaway.clone()));
        assert_eq!(snapshots.fetch_snapshot().await.unwrap(), Some(giveaway));
        assert_eq!(backend.fetch_calls(), 2);
    }
}
