//! End-to-end tests over loopback TCP

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use frame_chat::listener;
use frame_chat::session::DEFAULT_OUTBOUND_QUEUE_DEPTH;
use frame_chat::{
    parse_command, ChatClient, Header, MessageType, RoomInfo, HEADER_SIZE, MAX_BODY_LENGTH,
};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener::serve(listener, DEFAULT_OUTBOUND_QUEUE_DEPTH));
    addr
}

async fn connect(addr: SocketAddr) -> (ChatClient, mpsc::UnboundedReceiver<RoomInfo>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ChatClient::connect(addr, move |info| {
        let _ = tx.send(info);
    })
    .await
    .unwrap();
    (client, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<RoomInfo>) -> RoomInfo {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for room info")
        .expect("client reader ended")
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<RoomInfo>) {
    assert!(timeout(QUIET, rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_chat_reaches_every_member_once() {
    let addr = start_server().await;
    let (alice, mut alice_rx) = connect(addr).await;
    let (_bob, mut bob_rx) = connect(addr).await;

    alice.write(parse_command("bindname alice").unwrap()).unwrap();
    alice.write(parse_command("chat hi").unwrap()).unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        let info = next(rx).await;
        assert_eq!(info.name, "alice");
        assert_eq!(info.information, "hi");
        assert!(info.time > 0);
        assert_quiet(rx).await;
    }
}

#[tokio::test]
async fn test_late_joiner_gets_history_in_order() {
    let addr = start_server().await;
    let (alice, mut alice_rx) = connect(addr).await;

    for n in 0..5 {
        alice
            .write(parse_command(&format!("chat line {}", n)).unwrap())
            .unwrap();
    }
    for _ in 0..5 {
        next(&mut alice_rx).await;
    }

    let (_carol, mut carol_rx) = connect(addr).await;
    for n in 0..5 {
        assert_eq!(next(&mut carol_rx).await.information, format!("line {}", n));
    }

    alice.write(parse_command("chat live").unwrap()).unwrap();
    assert_eq!(next(&mut carol_rx).await.information, "live");
    assert_quiet(&mut carol_rx).await;
}

#[tokio::test]
async fn test_unnamed_sender_has_empty_name() {
    let addr = start_server().await;
    let (anon, mut rx) = connect(addr).await;

    anon.write(parse_command("chat who am i").unwrap()).unwrap();
    let info = next(&mut rx).await;
    assert_eq!(info.name, "");
    assert_eq!(info.information, "who am i");
}

#[tokio::test]
async fn test_oversized_frame_closes_only_that_connection() {
    let addr = start_server().await;
    let (alice, mut alice_rx) = connect(addr).await;

    let mut raw = TcpStream::connect(addr).await.unwrap();
    raw.write_all(&Header::new(2000, MessageType::ChatInfo.tag()).encode())
        .await
        .unwrap();

    let mut buf = [0u8; HEADER_SIZE];
    let closed = timeout(WAIT, raw.read(&mut buf)).await.expect("server kept the connection open");
    assert!(matches!(closed, Ok(0) | Err(_)));

    // the room keeps serving everyone else
    alice.write(parse_command("chat still up").unwrap()).unwrap();
    assert_eq!(next(&mut alice_rx).await.information, "still up");
}

#[tokio::test]
async fn test_client_close_flushes_queue() {
    let addr = start_server().await;
    let (_watcher, mut watcher_rx) = connect(addr).await;
    let (sender, _rx) = connect(addr).await;

    sender.write(parse_command("bindname dave").unwrap()).unwrap();
    sender.write(parse_command("chat bye").unwrap()).unwrap();
    sender.close().await.unwrap();

    let info = next(&mut watcher_rx).await;
    assert_eq!((info.name.as_str(), info.information.as_str()), ("dave", "bye"));
}

#[tokio::test]
async fn test_chat_too_large_to_broadcast_does_not_stall_room() {
    let addr = start_server().await;
    let (alice, mut alice_rx) = connect(addr).await;
    let (_bob, mut bob_rx) = connect(addr).await;

    let big = parse_command(&format!("chat {}", "x".repeat(1442))).unwrap();
    assert_eq!(big.body_length(), MAX_BODY_LENGTH as usize);
    alice.write(big).unwrap();
    alice.write(parse_command("chat small").unwrap()).unwrap();

    assert_eq!(next(&mut alice_rx).await.information, "small");
    assert_eq!(next(&mut bob_rx).await.information, "small");

    let (_carol, mut carol_rx) = connect(addr).await;
    assert_eq!(next(&mut carol_rx).await.information, "small");
    assert_quiet(&mut carol_rx).await;

    alice.write(parse_command("chat after").unwrap()).unwrap();
    assert_eq!(next(&mut bob_rx).await.information, "after");
    assert_eq!(next(&mut carol_rx).await.information, "after");
}
