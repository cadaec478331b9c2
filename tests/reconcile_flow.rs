//! Integration tests for a running bridge: settings changes reach the wire
//! and addressed lines reach the message bus.

mod common;

use common::{FakeServer, TestPeer, fast_policy, irc_connection, local_settings};
use corsica_irc::bus::{BusMessage, COMMAND_TOPIC, ChannelBus};
use corsica_irc::config::{IrcSettings, StoredSettings};
use corsica_irc::store::{MemoryStore, SettingsHandle, SettingsStore};
use corsica_irc::{Bridge, SessionParts};
use corsica_irc_proto::Command;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

const NS: &str = "corsica-irc";

struct Running {
    store: Arc<MemoryStore>,
    bus: mpsc::Receiver<BusMessage>,
    stop: oneshot::Sender<()>,
    bridge: Bridge,
}

/// Seed the store with `initial`, start a bridge and complete registration.
async fn start_bridge(server: &FakeServer, initial: &IrcSettings) -> (Running, TestPeer) {
    let value = serde_json::to_value(StoredSettings::from(initial)).unwrap();
    let store = Arc::new(MemoryStore::with_value(NS, value));
    let settings = SettingsHandle::setup(store.clone(), NS, IrcSettings::default());
    let (connection, events) = irc_connection(initial);
    let (bus, bus_rx) = ChannelBus::new(16);
    let (stop, stopped) = oneshot::channel::<()>();

    let bridge = Bridge::spawn(
        SessionParts {
            settings,
            connection,
            events,
            bus: Arc::new(bus),
            policy: fast_policy(),
        },
        async {
            let _ = stopped.await;
        },
    );

    let mut peer = server.accept().await.expect("bridge connects");
    let nick = peer.expect_registration().await.expect("registration");
    peer.welcome(&nick).await.unwrap();
    peer.expect_joins(initial.channels.len()).await.unwrap();

    (
        Running {
            store,
            bus: bus_rx,
            stop,
            bridge,
        },
        peer,
    )
}

async fn save(store: &MemoryStore, settings: &IrcSettings) {
    let value = serde_json::to_value(StoredSettings::from(settings)).unwrap();
    store.save(NS, value).await.unwrap();
}

#[tokio::test]
async fn test_channel_change_parts_then_joins() {
    let server = FakeServer::bind().await.unwrap();
    let initial = local_settings(server.port(), "corsica", &["#a", "#b", "#c"]);
    let (running, mut peer) = start_bridge(&server, &initial).await;

    let next = local_settings(server.port(), "corsica", &["#b", "#c", "#d"]);
    save(&running.store, &next).await;

    let part = peer.recv().await.unwrap();
    assert!(matches!(part.command, Command::PART(ref c, _) if c == "#a"));
    let join = peer.recv().await.unwrap();
    assert!(matches!(join.command, Command::JOIN(ref c, _) if c == "#d"));
    peer.expect_silence().await.unwrap();

    let _ = running.stop.send(());
    running.bridge.join().await;
}

#[tokio::test]
async fn test_identical_update_sends_nothing() {
    let server = FakeServer::bind().await.unwrap();
    let initial = local_settings(server.port(), "corsica", &["#x"]);
    let (running, mut peer) = start_bridge(&server, &initial).await;

    save(&running.store, &initial).await;
    peer.expect_silence().await.unwrap();

    let _ = running.stop.send(());
    running.bridge.join().await;
}

#[tokio::test]
async fn test_nick_change_sends_nick() {
    let server = FakeServer::bind().await.unwrap();
    let initial = local_settings(server.port(), "corsica", &["#x"]);
    let (running, mut peer) = start_bridge(&server, &initial).await;

    save(&running.store, &local_settings(server.port(), "corsica2", &["#x"])).await;

    match peer.recv().await.unwrap().command {
        Command::NICK(nick) => assert_eq!(nick, "corsica2"),
        other => panic!("expected NICK, got {:?}", other),
    }
    peer.expect_silence().await.unwrap();

    let _ = running.stop.send(());
    running.bridge.join().await;
}

#[tokio::test]
async fn test_endpoint_change_moves_to_new_server() {
    let first = FakeServer::bind().await.unwrap();
    let second = FakeServer::bind().await.unwrap();
    let initial = local_settings(first.port(), "corsica", &["#x"]);
    let (running, mut old_peer) = start_bridge(&first, &initial).await;

    save(
        &running.store,
        &local_settings(second.port(), "corsica2", &["#y"]),
    )
    .await;

    let quit = old_peer.recv().await.unwrap();
    assert!(matches!(quit.command, Command::QUIT(_)));

    let mut new_peer = second.accept().await.unwrap();
    assert_eq!(new_peer.expect_registration().await.unwrap(), "corsica2");
    new_peer.welcome("corsica2").await.unwrap();
    assert_eq!(new_peer.expect_joins(1).await.unwrap(), vec!["#y"]);

    let _ = running.stop.send(());
    running.bridge.join().await;
}

#[tokio::test]
async fn test_addressed_message_reaches_bus() {
    let server = FakeServer::bind().await.unwrap();
    let initial = local_settings(server.port(), "corsica", &["#bots"]);
    let (mut running, mut peer) = start_bridge(&server, &initial).await;

    peer.privmsg("alice", "#bots", "hello there").await.unwrap();
    peer.privmsg("alice", "#bots", "corsica: deploy foo")
        .await
        .unwrap();

    let msg = timeout(Duration::from_secs(5), running.bus.recv())
        .await
        .expect("bus message in time")
        .expect("bus open");
    assert_eq!(msg.topic, COMMAND_TOPIC);
    assert_eq!(msg.payload, json!({"raw": "deploy foo"}));

    let _ = running.stop.send(());
    running.bridge.join().await;
    assert!(running.bus.try_recv().is_err());
}

#[tokio::test]
async fn test_bare_string_channels_are_repaired_on_startup() {
    let server = FakeServer::bind().await.unwrap();
    let store = Arc::new(MemoryStore::with_value(
        NS,
        json!({"server": "127.0.0.1", "port": server.port(), "nick": "corsica", "channels": "#bots"}),
    ));
    let settings = SettingsHandle::setup(store.clone(), NS, IrcSettings::default());
    let (connection, events) = irc_connection(&IrcSettings::default());
    let (bus, _bus_rx) = ChannelBus::new(4);
    let (stop, stopped) = oneshot::channel::<()>();

    let bridge = Bridge::spawn(
        SessionParts {
            settings,
            connection,
            events,
            bus: Arc::new(bus),
            policy: fast_policy(),
        },
        async {
            let _ = stopped.await;
        },
    );

    let mut peer = server.accept().await.unwrap();
    peer.expect_registration().await.unwrap();
    peer.welcome("corsica").await.unwrap();
    assert_eq!(peer.expect_joins(1).await.unwrap(), vec!["#bots"]);

    assert_eq!(store.write_count(), 1);
    assert_eq!(store.snapshot(NS).unwrap()["channels"], json!(["#bots"]));

    let _ = stop.send(());
    bridge.join().await;
}

#[tokio::test]
async fn test_unreachable_server_does_not_panic() {
    // Bind then drop to get a port nothing listens on.
    let port = FakeServer::bind().await.unwrap().port();
    let store = Arc::new(MemoryStore::with_value(
        NS,
        serde_json::to_value(StoredSettings::from(&local_settings(port, "corsica", &[]))).unwrap(),
    ));
    let settings = SettingsHandle::setup(store, NS, IrcSettings::default());
    let (connection, events) = irc_connection(&IrcSettings::default());
    let (bus, _bus_rx) = ChannelBus::new(1);

    let bridge = Bridge::spawn(
        SessionParts {
            settings,
            connection,
            events,
            bus: Arc::new(bus),
            policy: fast_policy(),
        },
        std::future::pending::<()>(),
    );

    timeout(Duration::from_secs(5), bridge.join())
        .await
        .expect("failed startup ends the bridge task");
}
