//! Chat Session
//!
//! Mediates between a [`Transport`] and the message log: applies optimistic
//! updates on send, matches acknowledgments to pending messages, and turns
//! inbound broadcasts into log entries. Everything the UI needs to react to is
//! published on the event channel returned by [`ChatSession::start`].

mod events;
mod log;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::packet::{ChatMessagePacket, Packet};
use crate::transport::{ConnectionState, Transport};
use crate::message::generate_user_id;
use crate::{ChatConfig, ChatMessage, DeliveryStatus};

use events::EventSink;

pub use events::ChatEvent;
pub use log::ChatLog;

pub struct ChatSession<T: Transport> {
    /// Connection to the chat server
    transport: Arc<T>,
    /// Message history, written by the event loop and by local sends
    log: Arc<Mutex<ChatLog>>,
    user_id: String,
    config: ChatConfig,
    /// Outgoing UI events, closed on dispose
    events: EventSink,
    /// Transport event loop handle
    event_handle: Option<JoinHandle<()>>,
}

impl<T: Transport> Drop for ChatSession<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Transport> ChatSession<T> {
    /// Create a session on top of `transport` and start listening to it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// The event channel is unbounded, so neither the session nor its event
    /// loop ever waits on the consumer.
    pub fn start(
        transport: T,
        config: ChatConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChatEvent>)> {
        config.validate()?;
        let user_id = config
            .user_id
            .clone()
            .unwrap_or_else(generate_user_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut session = Self {
            transport: Arc::new(transport),
            log: Arc::new(Mutex::new(ChatLog::new(config.max_messages))),
            user_id,
            config,
            events: EventSink::new(sender),
            event_handle: None,
        };
        session.event_handle = Some(session.start_event_loop());
        Ok((session, receiver))
    }

    /// Identifier our own messages are sent under.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Connect to the host and port from the session config.
    pub async fn connect(&self) -> Result<()> {
        self.connect_to(&self.config.host, self.config.port).await
    }

    pub async fn connect_to(&self, host: &str, port: u16) -> Result<()> {
        self.transport.connect(host, port).await?;
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.transport.disconnect().await?;
        Ok(())
    }

    /// Send a chat message.
    ///
    /// The message is added to the log as `Pending` before it is handed to
    /// the transport. Returns the new message id, or `None` if nothing was sent
    /// because the text is blank or we are not connected. A transport failure
    /// marks the message `Failed` and is reported as a
    /// [`ChatEvent::MessageSent`] rather than an error.
    pub async fn send_message(&self, text: &str) -> Result<Option<String>> {
        if text.trim().is_empty() || !self.transport.is_connected() {
            return Ok(None);
        }

        let message = ChatMessage::outgoing(&self.user_id, &self.config.display_name, text)?;
        let message_id = message.id.clone();
        let packet = Packet::ChatMessage(ChatMessagePacket {
            message_id: message_id.clone(),
            message: message.content.clone(),
            timestamp: message.timestamp,
        });

        // Optimistic update, reconciled when the acknowledgment arrives.
        lock(&self.log).append(message.clone())?;
        self.publish(ChatEvent::MessageReceived(message));

        if let Err(e) = self.transport.send(packet).await {
            tracing::warn!(message_id = %message_id, error = %e, "chat message was not sent");
            // The message may already have been evicted.
            let _ = lock(&self.log).set_status(&message_id, DeliveryStatus::Failed);
            self.publish(ChatEvent::MessageSent {
                message_id: message_id.clone(),
                success: false,
                error: Some(e.to_string()),
            });
        }
        Ok(Some(message_id))
    }

    /// Snapshot of the message log, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.log).messages()
    }

    /// Look at the log without copying it.
    pub fn with_log<R>(&self, f: impl FnOnce(&ChatLog) -> R) -> R {
        let log = lock(&self.log);
        f(&*log)
    }

    pub fn message_count(&self) -> usize {
        lock(&self.log).len()
    }

    pub fn clear_messages(&self) {
        lock(&self.log).clear();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Stop listening to the transport and stop publishing events.
    ///
    /// Safe to call more than once. Events published before this call may
    /// still be waiting in the receiver, nothing is published after it.
    pub fn dispose(&mut self) {
        self.events.close();
        if let Some(handle) = self.event_handle.take() {
            handle.abort();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.event_handle.is_none()
    }

    fn publish(&self, event: ChatEvent) {
        if !self.events.publish(event) {
            tracing::debug!("chat event receiver dropped");
        }
    }
}

pub(crate) fn lock(log: &Mutex<ChatLog>) -> MutexGuard<'_, ChatLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
