//! Bridge Tests

use std::time::{Duration, Instant};

use devlink::protocol::{Command, CommandName, Reply};
use devlink::{BridgeError, Config, TcpBridge, Transport};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::support::{config_for, listener, read_request, saturated_listener};

// =============================================================================
// Completion Tests
// =============================================================================

#[tokio::test]
async fn test_reply_then_hold_open_returns_without_waiting() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(br#"{"success":true,"message":"pong"}"#)
            .await
            .unwrap();
        // Hold the connection well past the bridge deadline
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(socket);
    });

    let bridge = TcpBridge::new(&config);
    let started = Instant::now();
    let reply = bridge.execute(Command::new(CommandName::Ping)).await.unwrap();

    assert_eq!(reply, Reply::ok("pong"));
    assert!(started.elapsed() < Duration::from_millis(1_500));
    peer.abort();
}

#[tokio::test]
async fn test_reply_then_immediate_close_succeeds() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"{\"success\":true,\"message\":\"Connection closed\"}\n")
            .await
            .unwrap();
    });

    let reply = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Close))
        .await
        .unwrap();
    assert!(reply.success);
    assert_eq!(reply.message.as_deref(), Some("Connection closed"));
}

#[tokio::test]
async fn test_fragmented_reply_is_reassembled() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 3_000);

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let reply = br#"{"success":true,"message":"Files listed","data":{"files":["ticket.sys","id.sys"]}}"#;
        for chunk in reply.chunks(7) {
            socket.write_all(chunk).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let reply = TcpBridge::new(&config)
        .execute(Command::new(CommandName::ListFiles))
        .await
        .unwrap();
    assert_eq!(reply.data.unwrap()["files"], json!(["ticket.sys", "id.sys"]));
    peer.abort();
}

#[tokio::test]
async fn test_only_first_reply_is_taken() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(b"{\"success\":true,\"message\":\"first\"}\n{\"success\":false}")
            .await
            .unwrap();
    });

    let reply = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap();
    assert_eq!(reply.message.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_request_is_encoded_command() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(br#"{"success":true}"#).await.unwrap();
        request
    });

    TcpBridge::new(&config)
        .execute(Command::read_file("ticket.sys"))
        .await
        .unwrap();

    let request = peer.await.unwrap();
    assert_eq!(json!(request), json!({"cmd": "read_file", "filename": "ticket.sys"}));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_close_without_bytes_is_decode_error() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        drop(socket);
    });

    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_close_mid_reply_is_decode_error() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(br#"{"success":true,"mess"#).await.unwrap();
    });

    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_garbage_fails_before_deadline() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 5_000);

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(b"<html>busy</html>").await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let started = Instant::now();
    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(4));
    peer.abort();
}

#[tokio::test]
async fn test_partial_reply_times_out_and_closes() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 300);

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(br#"{"success":tr"#).await.unwrap();
        // The bridge must tear the connection down at its deadline
        let mut buf = [0u8; 16];
        tokio::time::timeout(Duration::from_secs(5), socket.read(&mut buf)).await
    });

    let started = Instant::now();
    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::DumpNand))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::Timeout(300)), "got {:?}", err);
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_secs(2));

    let observed = peer.await.unwrap().expect("peer never saw the connection close");
    assert!(matches!(observed, Ok(0) | Err(_)), "got {:?}", observed);
}

#[tokio::test]
async fn test_silent_peer_times_out() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 200);

    let peer = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(socket);
    });

    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Status))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(_)), "got {:?}", err);
    peer.abort();
}

#[tokio::test]
async fn test_slow_connect_counts_against_deadline() {
    let (listener, _fillers) = saturated_listener().await;
    let config = config_for(listener.local_addr().unwrap(), 1_500);

    // Drain the queue partway through, so the bridge's retransmitted SYN
    // connects to a peer that never answers
    let peer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        let mut held = Vec::new();
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            held.push(socket);
        }
    });

    let started = Instant::now();
    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::Timeout(1_500)), "got {:?}", err);
    assert!(elapsed >= Duration::from_millis(1_500));
    assert!(elapsed < Duration::from_millis(1_900), "took {:?}", elapsed);
    peer.abort();
}

#[tokio::test]
async fn test_connect_never_completing_is_timeout() {
    let (listener, _fillers) = saturated_listener().await;
    let config = config_for(listener.local_addr().unwrap(), 300);

    let started = Instant::now();
    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout(300)), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_millis(700));
    drop(listener);
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = config_for(addr, 2_000);

    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::Ping))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Connection(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_oversized_reply_is_decode_error() {
    let listener = listener().await;
    let addr = listener.local_addr().unwrap();
    let config = Config::builder()
        .upstream(addr.ip().to_string(), addr.port())
        .timeout_ms(3_000)
        .max_reply_size(64)
        .build();

    let peer = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let mut reply = br#"{"success":true,"message":""#.to_vec();
        reply.extend(std::iter::repeat(b'a').take(256));
        socket.write_all(&reply).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let err = TcpBridge::new(&config)
        .execute(Command::new(CommandName::DumpFs))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Decode(_)), "got {:?}", err);
    peer.abort();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test]
async fn test_concurrent_exchanges_do_not_cross() {
    let slow = listener().await;
    let fast = listener().await;
    let slow_config = config_for(slow.local_addr().unwrap(), 3_000);
    let fast_config = config_for(fast.local_addr().unwrap(), 3_000);

    tokio::spawn(async move {
        let (mut socket, _) = slow.accept().await.unwrap();
        read_request(&mut socket).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        socket.write_all(br#"{"success":true,"message":"slow"}"#).await.unwrap();
    });
    tokio::spawn(async move {
        let (mut socket, _) = fast.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(br#"{"success":true,"message":"fast"}"#).await.unwrap();
    });

    let slow_bridge = TcpBridge::new(&slow_config);
    let fast_bridge = TcpBridge::new(&fast_config);
    let (slow_reply, fast_reply) = tokio::join!(
        slow_bridge.execute(Command::new(CommandName::Ping)),
        fast_bridge.execute(Command::new(CommandName::Ping)),
    );

    assert_eq!(slow_reply.unwrap().message.as_deref(), Some("slow"));
    assert_eq!(fast_reply.unwrap().message.as_deref(), Some("fast"));
}

#[tokio::test]
async fn test_one_connection_per_command() {
    let listener = listener().await;
    let config = config_for(listener.local_addr().unwrap(), 2_000);

    let peer = tokio::spawn(async move {
        let mut served = 0;
        for expected in ["init", "list_files"] {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            assert_eq!(request["cmd"], json!(expected));
            socket.write_all(br#"{"success":true}"#).await.unwrap();
            served += 1;
        }
        served
    });

    let bridge = TcpBridge::new(&config);
    bridge.execute(Command::new(CommandName::Init)).await.unwrap();
    bridge.execute(Command::new(CommandName::ListFiles)).await.unwrap();

    assert_eq!(peer.await.unwrap(), 2);
}
