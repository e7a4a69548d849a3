use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use super::{ConnectionState, Notifier, Transport, TransportEvent};
use crate::packet::{ChatBroadcast, ChatMessageAck, ChatMessagePacket, Packet};
use crate::Error;
use crate::message::{generate_user_id, now_millis};

/// Behaviour of a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockOptions {
    pub connect_delay: Duration,
    pub send_delay: Duration,
    pub ack_delay: Duration,
    pub echo_delay: Duration,
    /// Acknowledge every chat message as accepted.
    pub auto_ack: bool,
    /// Broadcast every chat message back, as if relayed by the server.
    pub echo: bool,
    /// Identity the mock server uses for echoed broadcasts.
    pub peer_id: String,
    pub peer_name: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(500),
            send_delay: Duration::from_millis(100),
            ack_delay: Duration::from_millis(50),
            echo_delay: Duration::from_millis(50),
            auto_ack: true,
            echo: true,
            peer_id: generate_user_id(),
            peer_name: "Player".to_string(),
        }
    }
}

impl MockOptions {
    /// No simulated latency at all.
    pub fn instant() -> Self {
        Self {
            connect_delay: Duration::ZERO,
            send_delay: Duration::ZERO,
            ack_delay: Duration::ZERO,
            echo_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Neither acknowledge nor echo, leaving responses to [`MockTransport::inject`].
    pub fn silent(mut self) -> Self {
        self.auto_ack = false;
        self.echo = false;
        self
    }
}

/// In-process transport that fabricates server responses.
///
/// Each chat message is acknowledged and then echoed back from the mock's own
/// peer identity. Packets can also be injected directly to drive tests.
#[derive(Debug)]
pub struct MockTransport {
    notifier: Notifier,
    options: MockOptions,
    sent: Mutex<Vec<Packet>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new(MockOptions::default())
    }
}

impl MockTransport {
    pub fn new(options: MockOptions) -> Self {
        Self {
            notifier: Notifier::new(),
            options,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &MockOptions {
        &self.options
    }

    /// Every packet handed to [`Transport::send`] while connected.
    pub fn sent_packets(&self) -> Vec<Packet> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deliver a packet to subscribers as if it came from the server.
    pub fn inject(&self, packet: Packet) {
        self.notifier.packet(packet);
    }

    /// Pretend another user sent a chat message. Ignored while not connected.
    pub fn simulate_incoming_message(&self, sender_id: &str, sender_name: &str, message: &str) {
        if !self.is_connected() {
            return;
        }
        let timestamp = now_millis().unwrap_or_default();
        self.inject(Packet::ChatBroadcast(ChatBroadcast {
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            message: message.to_string(),
            timestamp,
        }));
    }

    /// Jump straight to a connection state, e.g. to simulate a dropped link.
    pub fn force_state(&self, state: ConnectionState, message: &str) {
        self.notifier.set_state(state, message);
    }

    async fn respond_to_chat(&self, packet: ChatMessagePacket) {
        if self.options.auto_ack {
            sleep(self.options.ack_delay).await;
            self.inject(Packet::ChatMessageAck(ChatMessageAck {
                message_id: packet.message_id.clone(),
                success: true,
                error: None,
            }));
        }
        if self.options.echo {
            sleep(self.options.echo_delay).await;
            self.inject(Packet::ChatBroadcast(ChatBroadcast {
                sender_id: self.options.peer_id.clone(),
                sender_name: self.options.peer_name.clone(),
                message: packet.message,
                timestamp: packet.timestamp,
            }));
        }
    }
}

impl Transport for MockTransport {
    async fn connect(&self, host: &str, port: u16) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }
        self.notifier.set_state(
            ConnectionState::Connecting,
            format!("Connecting to {host}:{port}..."),
        );
        sleep(self.options.connect_delay).await;
        self.notifier
            .set_state(ConnectionState::Connected, "Connected successfully");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        if self.state() == ConnectionState::Disconnected {
            return Ok(());
        }
        self.notifier
            .set_state(ConnectionState::Disconnected, "Disconnected");
        Ok(())
    }

    async fn send(&self, packet: Packet) -> Result<(), Error> {
        if !self.is_connected() {
            tracing::warn!(packet = packet.kind(), "cannot send packet: not connected");
            return Err(Error::NotConnected);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(packet.clone());

        sleep(self.options.send_delay).await;

        match packet {
            Packet::ChatMessage(chat) => self.respond_to_chat(chat).await,
            Packet::Ping(heartbeat) => self.inject(Packet::Pong(heartbeat)),
            _ => {}
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.notifier.state()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
        self.notifier.subscribe()
    }
}
