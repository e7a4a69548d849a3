#![allow(dead_code)]

use anyhow::Result;
use chat_client_core::*;
use std::time::Duration;
use tokio::sync::mpsc;

pub async fn await_event(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> Result<ChatEvent> {
    let duration = Duration::from_secs(2);
    tokio::time::timeout(duration, events.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
}

/// Wait for the `Connecting` and `Connected` notifications.
pub async fn await_connected(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> Result<()> {
    for expected in [ConnectionState::Connecting, ConnectionState::Connected] {
        match await_event(events).await? {
            ChatEvent::NetworkStateChanged { state, .. } => assert_eq!(state, expected),
            other => panic!("Expected a state change to {expected}, got {other:?}"),
        }
    }
    Ok(())
}

/// Start a session on a mock transport and connect it.
pub async fn connected_session(
    options: MockOptions,
) -> Result<(ChatSession<MockTransport>, mpsc::UnboundedReceiver<ChatEvent>)> {
    let (session, mut events) =
        ChatSession::start(MockTransport::new(options), ChatConfig::default())?;
    session.connect().await?;
    await_connected(&mut events).await?;
    assert!(session.is_connected());
    Ok((session, events))
}

/// Push a presence packet through the transport and wait for it to come out
/// the other side, so everything injected before it has been processed.
pub async fn sync_marker(
    session: &ChatSession<MockTransport>,
    events: &mut mpsc::UnboundedReceiver<ChatEvent>,
) -> Result<()> {
    let marker = UserPresence {
        user_id: "user_marker".to_string(),
        user_name: "Marker".to_string(),
    };
    session.transport().inject(Packet::UserJoin(marker.clone()));
    match await_event(events).await? {
        ChatEvent::UserJoined(user) => assert_eq!(user, marker),
        other => panic!("Expected the marker join, got {other:?}"),
    }
    Ok(())
}

pub fn test_message(id: &str) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        sender_id: "user_test".to_string(),
        sender_name: "Tester".to_string(),
        content: format!("message {id}"),
        timestamp: 0,
        is_own: false,
        status: DeliveryStatus::Delivered,
    }
}
