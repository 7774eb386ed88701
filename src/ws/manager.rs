//! Connection manager: one live channel bound to the active giveaway.
//!
//! A background task owns the channel, the pending reconnect timer and the
//! attempt counter. The public handle only sends commands, so `connect()` and
//! `disconnect()` are synchronous and always applied in call order.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──open + auth──▶ Connected
//!      ▲                        │                          │
//!      │                        └──fail──┐   ┌──close──────┘
//!      │                                 ▼   ▼
//!      └──────── timer (base·2^n) ◀── attempts ≤ max ──▶ Error (manual connect only)
//! ```
//!
//! The task also watches the [`GiveawayStore`]: a cleared or finished giveaway
//! tears the channel down, and a newly active one opens it when `auto_connect`
//! is set and the user has not disconnected manually.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::auth::SessionStore;
use crate::domain::giveaway::{ActiveGiveaway, GiveawayStore, SnapshotSource};
use crate::error::WsError;
use crate::shared::GiveawayId;
use crate::ws::backoff::ReconnectTimer;
use crate::ws::router::{MessageRouter, RouteOutcome};
use crate::ws::transport::{Connector, Frame, Link};
use crate::ws::{ConnectionState, MessageOut, WsConfig};

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Connect,
    Disconnect,
    Shutdown,
}

// ─── Background task state ───────────────────────────────────────────────────

struct PendingConnect {
    giveaway_id: GiveawayId,
    fut: BoxFuture<'static, Result<Link, WsError>>,
}

struct OpenLink {
    giveaway_id: GiveawayId,
    link: Link,
}

struct TaskState {
    config: WsConfig,
    connector: Arc<dyn Connector>,
    session: Arc<dyn SessionStore>,
    snapshots: Arc<dyn SnapshotSource>,
    store: GiveawayStore,
    router: MessageRouter,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    giveaway_rx: watch::Receiver<Option<ActiveGiveaway>>,
    state_tx: watch::Sender<ConnectionState>,
    attempts: Arc<AtomicU32>,
    /// Set by `disconnect()`; suppresses auto-connect and reconnects.
    manual_disconnect: bool,
    /// Giveaway the channel (open, opening, or waiting to reopen) belongs to.
    bound: Option<GiveawayId>,
    pending: Option<PendingConnect>,
    open: Option<OpenLink>,
    timer: ReconnectTimer,
}

// ═════════════════════════════════════════════════════════════════════════════
// Public handle
// ═════════════════════════════════════════════════════════════════════════════

/// Handle to the live-updates connection task.
///
/// Dropping the handle aborts the task; use [`ConnectionManager::shutdown`]
/// to close the channel gracefully.
pub struct ConnectionManager {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    attempts: Arc<AtomicU32>,
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Start the connection task. Must be called inside a tokio runtime.
    pub fn spawn<C: Connector>(
        config: WsConfig,
        connector: C,
        store: GiveawayStore,
        session: Arc<dyn SessionStore>,
        snapshots: Arc<dyn SnapshotSource>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let attempts = Arc::new(AtomicU32::new(0));

        let state = TaskState {
            config,
            connector: Arc::new(connector),
            session,
            snapshots,
            router: MessageRouter::new(store.clone()),
            giveaway_rx: store.subscribe(),
            store,
            cmd_rx,
            state_tx,
            attempts: attempts.clone(),
            manual_disconnect: false,
            bound: None,
            pending: None,
            open: None,
            timer: ReconnectTimer::new(),
        };

        Self {
            cmd_tx,
            state_rx,
            attempts,
            task_handle: Some(tokio::spawn(run_task(state))),
        }
    }

    /// Open the channel for the active giveaway.
    ///
    /// No-op while connected or connecting, and when no active giveaway is
    /// tracked. From `Error` this is the manual recovery path.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Close the channel and cancel any pending reconnect.
    ///
    /// Suppresses auto-connect until the next `connect()`.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Consecutive unexpected closes since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Close the channel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                tracing::debug!("Connection task ended abnormally: {}", e);
            }
        }
    }

    fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::debug!("Connection task is gone; command dropped");
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Background task
// ═════════════════════════════════════════════════════════════════════════════

async fn run_task(mut state: TaskState) {
    let initial = state.giveaway_rx.borrow_and_update().clone();
    state.on_giveaway_changed(initial).await;

    loop {
        tokio::select! {
            biased;

            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Connect) => state.on_connect(),
                Some(Command::Disconnect) => state.on_disconnect().await,
                Some(Command::Shutdown) | None => {
                    state.teardown().await;
                    state.publish(ConnectionState::Disconnected);
                    tracing::debug!("Connection task stopped");
                    return;
                }
            },

            changed = state.giveaway_rx.changed() => {
                if changed.is_err() {
                    state.teardown().await;
                    return;
                }
                let snapshot = state.giveaway_rx.borrow_and_update().clone();
                state.on_giveaway_changed(snapshot).await;
            },

            (giveaway_id, result) = next_attempt(&mut state.pending) => {
                state.pending = None;
                state.on_attempt_finished(giveaway_id, result);
            },

            frame = next_frame(&mut state.open) => state.on_frame(frame).await,

            () = state.timer.fired() => state.on_timer(),
        }
    }
}

/// Resolves with the outcome of the in-flight attempt; pending when there is none.
async fn next_attempt(pending: &mut Option<PendingConnect>) -> (GiveawayId, Result<Link, WsError>) {
    match pending {
        Some(p) => {
            let result = p.fut.as_mut().await;
            (p.giveaway_id.clone(), result)
        }
        None => std::future::pending().await,
    }
}

async fn next_frame(open: &mut Option<OpenLink>) -> Option<Result<Frame, WsError>> {
    match open {
        Some(o) => o.link.stream.next().await,
        None => std::future::pending().await,
    }
}

impl TaskState {
    fn publish(&self, next: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                tracing::debug!(from = %current, to = %next, "Connection state changed");
                *current = next;
                true
            }
        });
    }

    fn is_busy(&self) -> bool {
        self.open.is_some() || self.pending.is_some() || self.timer.is_pending()
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn on_connect(&mut self) {
        self.manual_disconnect = false;

        if self.is_busy() {
            tracing::debug!("connect() ignored: already connected or connecting");
            return;
        }
        let Some(giveaway) = self.store.snapshot().filter(ActiveGiveaway::is_active) else {
            tracing::debug!("connect() ignored: no active giveaway");
            return;
        };

        if self.attempts.load(Ordering::SeqCst) > self.config.reconnect.max_attempts {
            tracing::info!("Manual reconnect after giving up");
            self.attempts.store(0, Ordering::SeqCst);
        }
        self.start_attempt(giveaway.id);
    }

    async fn on_disconnect(&mut self) {
        self.manual_disconnect = true;
        if self.timer.is_pending() {
            tracing::debug!("Pending reconnect cancelled");
        }
        self.teardown().await;
        self.publish(ConnectionState::Disconnected);
    }

    // ── Store observation ────────────────────────────────────────────────

    async fn on_giveaway_changed(&mut self, snapshot: Option<ActiveGiveaway>) {
        match snapshot {
            Some(giveaway) if giveaway.is_active() => match &self.bound {
                Some(bound) if *bound == giveaway.id => {}
                Some(bound) => {
                    tracing::info!(
                        from = %bound,
                        to = %giveaway.id,
                        "Active giveaway switched; rebinding live updates"
                    );
                    self.teardown().await;
                    self.attempts.store(0, Ordering::SeqCst);
                    self.publish(ConnectionState::Disconnected);
                    self.maybe_auto_connect(giveaway.id);
                }
                None => self.maybe_auto_connect(giveaway.id),
            },
            _ => {
                if let Some(bound) = &self.bound {
                    tracing::info!(giveaway_id = %bound, "Active giveaway gone; closing live updates");
                    self.teardown().await;
                    self.publish(ConnectionState::Disconnected);
                }
                // A manual disconnect applies to one giveaway's channel only.
                self.manual_disconnect = false;
                self.attempts.store(0, Ordering::SeqCst);
            }
        }
    }

    fn maybe_auto_connect(&mut self, giveaway_id: GiveawayId) {
        if self.config.auto_connect && !self.manual_disconnect {
            self.start_attempt(giveaway_id);
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────────────

    fn start_attempt(&mut self, giveaway_id: GiveawayId) {
        let url = self.config.channel_url(&giveaway_id);
        tracing::info!(
            giveaway_id = %giveaway_id,
            attempt = self.attempts.load(Ordering::SeqCst),
            "Connecting to live updates at {}",
            url
        );

        let connector = self.connector.clone();
        let session = self.session.clone();
        let fut = async move {
            let mut link = connector.connect(&url).await?;
            match session.bearer_token().await {
                Some(token) => link.sink.send(MessageOut::auth(token).to_json()?).await?,
                None => tracing::warn!("No session token; live updates handshake skipped"),
            }
            Ok::<_, WsError>(link)
        }
        .boxed();

        self.bound = Some(giveaway_id.clone());
        self.pending = Some(PendingConnect { giveaway_id, fut });
        self.publish(ConnectionState::Connecting);
    }

    fn on_attempt_finished(&mut self, giveaway_id: GiveawayId, result: Result<Link, WsError>) {
        match result {
            Ok(link) => {
                self.attempts.store(0, Ordering::SeqCst);
                tracing::info!(giveaway_id = %giveaway_id, "Live updates connected");
                self.open = Some(OpenLink { giveaway_id, link });
                self.publish(ConnectionState::Connected);
            }
            Err(e) => {
                tracing::warn!(giveaway_id = %giveaway_id, "Live updates connection failed: {}", e);
                self.on_closed(giveaway_id);
            }
        }
    }

    async fn on_frame(&mut self, frame: Option<Result<Frame, WsError>>) {
        let reason = match frame {
            Some(Ok(Frame::Text(text))) => {
                if let RouteOutcome::RefreshRequested(giveaway_id) = self.router.route(&text) {
                    self.spawn_refresh(giveaway_id);
                }
                return;
            }
            Some(Ok(Frame::Close { code, reason })) => WsError::Closed { code, reason },
            Some(Err(e)) => e,
            None => WsError::Closed {
                code: None,
                reason: "Stream ended".to_string(),
            },
        };

        if let Some(open) = self.open.take() {
            tracing::info!(giveaway_id = %open.giveaway_id, "Live updates closed: {}", reason);
            self.on_closed(open.giveaway_id);
        }
    }

    /// Unexpected close or failed attempt: schedule a reconnect or give up.
    fn on_closed(&mut self, giveaway_id: GiveawayId) {
        self.publish(ConnectionState::Disconnected);
        if self.manual_disconnect {
            return;
        }

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let policy = self.config.reconnect;
        if !policy.allows(attempt) {
            tracing::warn!(
                giveaway_id = %giveaway_id,
                "Giving up on live updates after {} reconnect attempts",
                policy.max_attempts
            );
            self.publish(ConnectionState::Error);
            return;
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::info!(
            "Reconnect attempt {}/{} in {}ms",
            attempt,
            policy.max_attempts,
            delay.as_millis()
        );
        self.timer.schedule(delay);
    }

    fn on_timer(&mut self) {
        match self.store.snapshot().filter(ActiveGiveaway::is_active) {
            Some(giveaway) => self.start_attempt(giveaway.id),
            None => {
                self.bound = None;
                self.publish(ConnectionState::Disconnected);
            }
        }
    }

    /// Drop every piece of connection state. Idempotent.
    async fn teardown(&mut self) {
        self.timer.cancel();
        self.pending = None;
        self.bound = None;
        if let Some(mut open) = self.open.take() {
            if let Err(e) = open.link.sink.close().await {
                tracing::debug!(giveaway_id = %open.giveaway_id, "Error closing live channel: {}", e);
            }
        }
    }

    // ── Server-pushed finish ─────────────────────────────────────────────

    fn spawn_refresh(&self, giveaway_id: GiveawayId) {
        let snapshots = self.snapshots.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            match snapshots.fetch_snapshot().await {
                Ok(snapshot) => {
                    store.apply_refresh(&giveaway_id, snapshot);
                }
                Err(e) => {
                    tracing::warn!(giveaway_id = %giveaway_id, "Refreshing finished giveaway failed: {}", e);
                }
            }
        });
    }
}
