//! Protocol Session Tests
//!
//! Drives a real session against a local WebSocket endpoint:
//! - Subscription on connect and the streaming acknowledgement
//! - Value updates reaching the panel sink
//! - Reconnection after the simulator drops the socket
//! - Shutdown during an active connection, a stalled connect or lookup,
//!   and the reconnect wait

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::SinkExt;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use common::{
    init_tracing, next_request, reply, wait_for_state, FakeSimulator, MockApi, StalledApi,
    TIMEOUT,
};
use panelbridge_core::prelude::*;

fn altitude_registry() -> MappingRegistry {
    let mut registry = MappingRegistry::new();
    registry
        .add_dataref(
            "laminar/B738/autopilot/mcp_alt_dial",
            OutboundMapping::new("set_altitude")
                .with_threshold(100.0)
                .with_transform(TransformKind::Round),
        )
        .unwrap();
    registry
        .add_boolean_dataref("laminar/B738/autopilot/alt_hld_status", "altitude_led")
        .unwrap();
    registry
}

fn start_session(
    url: String,
    api: impl SimulatorApi + 'static,
    reconnect_delay: Duration,
) -> (
    Arc<ProtocolSession>,
    mpsc::UnboundedReceiver<DeviceCommand>,
    tokio::task::JoinHandle<()>,
) {
    init_tracing();
    let resolver = Arc::new(IdentifierResolver::new(Arc::new(api)));
    let (sink, panel) = ChannelSink::new();
    let session = Arc::new(ProtocolSession::new(
        SessionConfig::new(url, reconnect_delay),
        Arc::new(altitude_registry()),
        resolver,
        Arc::new(sink),
    ));
    let handle = tokio::spawn(Arc::clone(&session).run());
    (session, panel, handle)
}

fn api() -> MockApi {
    MockApi::new()
        .dataref("laminar/B738/autopilot/mcp_alt_dial", 101)
        .dataref("laminar/B738/autopilot/alt_hld_status", 102)
}

#[tokio::test]
async fn test_subscribe_and_stream_updates() {
    let sim = FakeSimulator::bind().await;
    let (session, mut panel, handle) = start_session(sim.url(), api(), Duration::from_millis(50));

    let mut ws = sim.accept().await;
    let subscribe = next_request(&mut ws).await;
    assert_eq!(subscribe["type"], "dataref_subscribe_values");
    // Names are subscribed in sorted order
    assert_eq!(
        subscribe["params"]["datarefs"],
        json!([{"id": 102}, {"id": 101}])
    );

    reply(
        &mut ws,
        json!({"type": "result", "req_id": subscribe["req_id"], "success": true}),
    )
    .await;
    wait_for_state(&session, SessionState::Streaming).await;

    reply(
        &mut ws,
        json!({"type": "dataref_update_values", "data": {"101": 12000.4}}),
    )
    .await;
    let command = tokio::time::timeout(TIMEOUT, panel.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(command.cmd, "set_altitude");
    assert_eq!(command.value, json!(12000));

    session.close();
    tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_reconnects_and_resubscribes() {
    let delay = Duration::from_millis(300);
    let sim = FakeSimulator::bind().await;
    let (session, _panel, handle) = start_session(sim.url(), api(), delay);

    let mut first = sim.accept().await;
    let first_subscribe = next_request(&mut first).await;
    let closed_at = Instant::now();
    first.send(Message::Close(None)).await.unwrap();
    drop(first);

    let mut second = sim.accept().await;
    assert!(
        closed_at.elapsed() >= delay,
        "reconnected after {:?}, before the {:?} delay",
        closed_at.elapsed(),
        delay
    );
    let second_subscribe = next_request(&mut second).await;
    assert_eq!(second_subscribe["type"], "dataref_subscribe_values");
    assert_eq!(
        second_subscribe["params"]["datarefs"],
        first_subscribe["params"]["datarefs"]
    );
    assert!(second_subscribe["req_id"].as_u64() > first_subscribe["req_id"].as_u64());

    // One close, one new connection
    sim.expect_no_connection(delay * 2).await;

    session.close();
    tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_resolver_reused_across_reconnects() {
    let sim = FakeSimulator::bind().await;
    let api = Arc::new(api());
    let resolver = Arc::new(IdentifierResolver::new(Arc::clone(&api) as Arc<dyn SimulatorApi>));
    let (sink, _panel) = ChannelSink::new();
    let session = Arc::new(ProtocolSession::new(
        SessionConfig::new(sim.url(), Duration::from_millis(20)),
        Arc::new(altitude_registry()),
        resolver,
        Arc::new(sink),
    ));
    let handle = tokio::spawn(Arc::clone(&session).run());

    let mut first = sim.accept().await;
    next_request(&mut first).await;
    first.send(Message::Close(None)).await.unwrap();
    drop(first);

    let mut second = sim.accept().await;
    next_request(&mut second).await;

    // Two datarefs, each looked up once
    assert_eq!(api.lookups(), 2);

    session.close();
    tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_close_cancels_pending_reconnect() {
    // Grab a free port, then stop listening so every connect fails
    let url = {
        let sim = FakeSimulator::bind().await;
        sim.url()
    };
    let (session, _panel, handle) = start_session(url, api(), Duration::from_secs(60));

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.close();

    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("session kept waiting to reconnect")
        .unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_failed_subscription_stays_pending() {
    let sim = FakeSimulator::bind().await;
    let (session, _panel, handle) = start_session(sim.url(), api(), Duration::from_millis(50));

    let mut ws = sim.accept().await;
    let subscribe = next_request(&mut ws).await;
    reply(
        &mut ws,
        json!({
            "type": "result",
            "req_id": subscribe["req_id"],
            "success": false,
            "error_code": "invalid_id",
            "error_message": "unknown dataref id"
        }),
    )
    .await;
    // Garbage is dropped without closing the socket
    ws.send(Message::Text("{not json".to_string())).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.state(), SessionState::SubscribePending);

    session.close();
    tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_close_abandons_stalled_lookup() {
    let sim = FakeSimulator::bind().await;
    let (session, _panel, handle) = start_session(sim.url(), StalledApi, Duration::from_millis(50));

    let _ws = sim.accept().await;
    wait_for_state(&session, SessionState::SubscribePending).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    session.close();
    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("session stuck in subscription lookup")
        .unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_close_abandons_stalled_connect() {
    // Accepts TCP but never answers the WebSocket handshake
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/api/v2", listener.local_addr().unwrap());
    let (session, _panel, handle) = start_session(url, api(), Duration::from_millis(50));

    let (_socket, _) = tokio::time::timeout(TIMEOUT, listener.accept())
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.state(), SessionState::Connecting);

    session.close();
    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("session stuck in connect")
        .unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}
