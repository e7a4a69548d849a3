//! Network Transport
//!
//! The capability the chat session talks to. Any transport (the in-process
//! mock, TCP, a WebSocket) can sit behind [`Transport`] without the session
//! knowing which one it is.

mod mock;
mod tcp;

use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::{Error, Packet};

pub use mock::{MockOptions, MockTransport};
pub use tcp::TcpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// Notifications emitted by a transport as they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged {
        state: ConnectionState,
        message: String,
    },
    PacketReceived(Packet),
}

pub trait Transport: Send + Sync + 'static {
    /// Open a connection. Does nothing if already connected.
    fn connect(&self, host: &str, port: u16) -> impl Future<Output = Result<(), Error>> + Send;

    /// Close the connection. Does nothing if already disconnected.
    fn disconnect(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Send a packet. Fails with [`Error::NotConnected`] unless connected.
    fn send(&self, packet: Packet) -> impl Future<Output = Result<(), Error>> + Send;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Listen for state changes and inbound packets.
    ///
    /// Every event emitted after this call is delivered, in order, however far
    /// behind the receiver falls. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<TransportEvent>;
}

/// Connection state plus the subscriber list, shared by the transports.
#[derive(Debug)]
pub(crate) struct Notifier {
    state: Mutex<ConnectionState>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: ConnectionState, message: impl Into<String>) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        let message = message.into();
        tracing::info!(%state, %message, "transport state changed");
        self.emit(TransportEvent::StateChanged { state, message });
    }

    pub(crate) fn packet(&self, packet: Packet) {
        self.emit(TransportEvent::PacketReceived(packet));
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Hand the event to every live subscriber, forgetting the ones that hung up.
    fn emit(&self, event: TransportEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
