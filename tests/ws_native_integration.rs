//! Integration tests for the native WebSocket transport.
//!
//! These tests connect to a live giveaway WS server and exercise the
//! connect → auth → receive → disconnect lifecycle.
//!
//! All tests are `#[ignore]` because they require network access and a
//! giveaway the test account owns. Configure them through `.env`:
//!
//! ```text
//! GIVEAWAY_WS_URL=wss://ws.staging.giveaway.example/ws/giveaway
//! GIVEAWAY_TEST_GIVEAWAY_ID=42
//! GIVEAWAY_TEST_TOKEN=<session token>
//! ```
//!
//! Run with:
//! ```bash
//! cargo test -p giveaway-sdk --features ws-native --test ws_native_integration -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::time::timeout;

use giveaway_sdk::auth::StaticSession;
use giveaway_sdk::client::GiveawayClientBuilder;
use giveaway_sdk::domain::giveaway::{ActiveGiveaway, GiveawayStore, SnapshotSource};
use giveaway_sdk::error::SdkError;
use giveaway_sdk::shared::GiveawayId;
use giveaway_sdk::ws::native::TungsteniteConnector;
use giveaway_sdk::ws::transport::{Connector, Frame};
use giveaway_sdk::ws::{ConnectionManager, ConnectionState, MessageOut, WsConfig};

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

fn env(key: &str) -> String {
    let _ = dotenvy::dotenv();
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set for live tests"))
}

fn test_config() -> WsConfig {
    let builder = GiveawayClientBuilder::from_env().expect("GIVEAWAY_* env is valid");
    let client = builder.auto_connect(false).build().expect("client builds");
    client.ws_config().clone()
}

fn test_giveaway() -> ActiveGiveaway {
    ActiveGiveaway::new(
        GiveawayId::new(env("GIVEAWAY_TEST_GIVEAWAY_ID")),
        "integration",
        Utc::now(),
    )
}

struct NoSnapshot;

impl SnapshotSource for NoSnapshot {
    fn fetch_snapshot(&self) -> BoxFuture<'_, Result<Option<ActiveGiveaway>, SdkError>> {
        async { Ok(None) }.boxed()
    }
}

async fn wait_for(
    rx: &mut tokio::sync::watch::Receiver<ConnectionState>,
    wanted: ConnectionState,
) {
    timeout(TEST_TIMEOUT, rx.wait_for(|s| *s == wanted))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {wanted}"))
        .expect("state channel closed");
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn raw_connect_and_auth() {
    let config = test_config();
    let giveaway = test_giveaway();
    let connector = TungsteniteConnector::new(config.connect_timeout);

    let mut link = connector
        .connect(&config.channel_url(&giveaway.id))
        .await
        .expect("connect should succeed");

    link.sink
        .send(MessageOut::auth(env("GIVEAWAY_TEST_TOKEN")).to_json().expect("auth serializes"))
        .await
        .expect("auth handshake sends");

    // The server stays quiet until something happens; a close here means
    // the handshake was rejected.
    if let Ok(Some(frame)) = timeout(Duration::from_secs(2), link.stream.next()).await {
        assert!(
            !matches!(frame, Ok(Frame::Close { .. })),
            "server closed after auth: {frame:?}"
        );
    }

    link.sink.close().await.expect("close should succeed");
}

#[tokio::test]
#[ignore]
async fn manager_connects_and_disconnects() {
    let config = test_config();
    let store = GiveawayStore::new();
    store.set_active_giveaway(test_giveaway());

    let manager = ConnectionManager::spawn(
        config.clone(),
        TungsteniteConnector::new(config.connect_timeout),
        store,
        Arc::new(StaticSession::new(env("GIVEAWAY_TEST_TOKEN"))),
        Arc::new(NoSnapshot),
    );
    let mut status = manager.subscribe();

    manager.connect();
    wait_for(&mut status, ConnectionState::Connected).await;
    assert_eq!(manager.reconnect_attempts(), 0);

    manager.disconnect();
    wait_for(&mut status, ConnectionState::Disconnected).await;

    manager.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn clearing_store_closes_channel() {
    let config = test_config();
    let store = GiveawayStore::new();
    store.set_active_giveaway(test_giveaway());

    let manager = ConnectionManager::spawn(
        config.clone(),
        TungsteniteConnector::new(config.connect_timeout),
        store.clone(),
        Arc::new(StaticSession::new(env("GIVEAWAY_TEST_TOKEN"))),
        Arc::new(NoSnapshot),
    );
    let mut status = manager.subscribe();

    manager.connect();
    wait_for(&mut status, ConnectionState::Connected).await;

    store.clear_active_giveaway();
    wait_for(&mut status, ConnectionState::Disconnected).await;

    manager.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn unreachable_host_exhausts_attempts() {
    let mut config = test_config();
    config.url = "ws://127.0.0.1:9/ws/giveaway".to_string();
    config.reconnect.base_delay = Duration::from_millis(10);
    config.reconnect.max_attempts = 2;

    let store = GiveawayStore::new();
    store.set_active_giveaway(test_giveaway());

    let manager = ConnectionManager::spawn(
        config.clone(),
        TungsteniteConnector::new(Duration::from_secs(2)),
        store,
        Arc::new(StaticSession::anonymous()),
        Arc::new(NoSnapshot),
    );
    let mut status = manager.subscribe();

    manager.connect();
    wait_for(&mut status, ConnectionState::Error).await;
    assert_eq!(manager.reconnect_attempts(), 3);

    manager.shutdown().await;
}
