//! In-memory giveaway backend for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::Notify;

use super::{ActiveGiveaway, FinishMessages, GiveawayBackend, Winner};
use crate::error::SdkError;
use crate::shared::{AccountId, GiveawayId};

/// Scripted backend: results are popped per call, defaulting to success.
#[derive(Default)]
pub(crate) struct FakeBackend {
    snapshot: Mutex<Option<ActiveGiveaway>>,
    persist_results: Mutex<VecDeque<Result<(), String>>>,
    finish_results: Mutex<VecDeque<Result<Vec<Winner>, String>>>,
    persisted: Mutex<Vec<(GiveawayId, FinishMessages)>>,
    finish_gate: Mutex<Option<Arc<Notify>>>,
    fetch_calls: AtomicUsize,
    finish_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn set_snapshot(&self, snapshot: Option<ActiveGiveaway>) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn push_persist_result(&self, result: Result<(), &str>) {
        self.persist_results
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    pub fn push_finish_result(&self, result: Result<Vec<Winner>, &str>) {
        self.finish_results
            .lock()
            .unwrap()
            .push_back(result.map_err(str::to_string));
    }

    /// Make every finish call wait until the returned handle is notified.
    pub fn gate_finish(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.finish_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn persisted(&self) -> Vec<(GiveawayId, FinishMessages)> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn finish_calls(&self) -> usize {
        self.finish_calls.load(Ordering::SeqCst)
    }
}

impl GiveawayBackend for FakeBackend {
    fn fetch_active_giveaway<'a>(
        &'a self,
        _account_id: &'a AccountId,
    ) -> BoxFuture<'a, Result<Option<ActiveGiveaway>, SdkError>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.snapshot.lock().unwrap().clone();
        async move { Ok(snapshot) }.boxed()
    }

    fn persist_finish_messages<'a>(
        &'a self,
        giveaway_id: &'a GiveawayId,
        messages: &'a FinishMessages,
    ) -> BoxFuture<'a, Result<(), SdkError>> {
        let result = self.persist_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.persisted
                .lock()
                .unwrap()
                .push((giveaway_id.clone(), messages.clone()));
        }
        async move { result.map_err(SdkError::Other) }.boxed()
    }

    fn finish_giveaway<'a>(
        &'a self,
        _giveaway_id: &'a GiveawayId,
    ) -> BoxFuture<'a, Result<Vec<Winner>, SdkError>> {
        self.finish_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.finish_gate.lock().unwrap().clone();
        let result = self.finish_results.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(vec![Winner {
                user_id: "1001".to_string(),
                username: Some("lucky".to_string()),
                place: 1,
            }])
        });
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result.map_err(SdkError::Other)
        }
        .boxed()
    }
}
