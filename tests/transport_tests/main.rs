//! Transport Tests
//!
//! Tests drive [`devlink::TcpBridge`] against scripted TCP peers and verify:
//! - Completion without waiting for the peer to close
//! - Completion when the peer closes right after replying
//! - Decode, timeout and connection failures
//! - No cross-delivery between concurrent exchanges

mod bridge_tests;
