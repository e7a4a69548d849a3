use std::sync::{Arc, Mutex, PoisonError};

use tokio::{sync::mpsc, task::JoinHandle};

use super::{ChatLog, ChatSession, lock};
use crate::packet::{Packet, UserPresence};
use crate::transport::{ConnectionState, Transport, TransportEvent};
use crate::{ChatMessage, DeliveryStatus, Error};

/// Events the session publishes to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    NetworkStateChanged {
        state: ConnectionState,
        message: String,
    },
    /// A message was added to the log, either our own or from another user.
    MessageReceived(ChatMessage),
    /// The outcome of one of our sends.
    MessageSent {
        message_id: String,
        success: bool,
        error: Option<String>,
    },
    UserJoined(UserPresence),
    UserLeft(UserPresence),
}

/// Publishing end of the UI event channel, shared by the session and its
/// event loop.
///
/// Closing it drops the only sender, so once [`EventSink::close`] returns
/// nothing more can be published and the receiver drains to `None`.
#[derive(Debug, Clone)]
pub(crate) struct EventSink(Arc<Mutex<Option<mpsc::UnboundedSender<ChatEvent>>>>);

impl EventSink {
    pub(crate) fn new(sender: mpsc::UnboundedSender<ChatEvent>) -> Self {
        Self(Arc::new(Mutex::new(Some(sender))))
    }

    /// Returns `false` once the sink is closed or the receiver is gone.
    pub(crate) fn publish(&self, event: ChatEvent) -> bool {
        let sender = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub(crate) fn close(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

impl<T: Transport> ChatSession<T> {
    pub(crate) fn start_event_loop(&self) -> JoinHandle<()> {
        // Subscribe before spawning so nothing emitted after `start` is missed.
        let mut sub = self.transport.subscribe();
        let transport = self.transport.clone();
        let log = self.log.clone();
        let user_id = self.user_id.clone();
        let sink = self.events.clone();

        tokio::spawn(async move {
            while let Some(event) = sub.recv().await {
                if sink.is_closed() {
                    break; // Disposed
                }
                match process_event(event, &transport, &log, &user_id).await {
                    Ok(None) => {} // No event to send
                    Err(e) => tracing::warn!(error = %e, "error processing transport event"),
                    Ok(Some(event)) => {
                        if !sink.publish(event) {
                            break; // Channel closed
                        }
                    }
                }
            }
        })
    }
}

async fn process_event<T: Transport>(
    event: TransportEvent,
    transport: &Arc<T>,
    log: &Mutex<ChatLog>,
    user_id: &str,
) -> Result<Option<ChatEvent>, Error> {
    match event {
        TransportEvent::StateChanged { state, message } => {
            Ok(Some(ChatEvent::NetworkStateChanged { state, message }))
        }
        TransportEvent::PacketReceived(packet) => {
            process_packet(packet, transport, log, user_id).await
        }
    }
}

async fn process_packet<T: Transport>(
    packet: Packet,
    transport: &Arc<T>,
    log: &Mutex<ChatLog>,
    user_id: &str,
) -> Result<Option<ChatEvent>, Error> {
    match packet {
        Packet::ChatBroadcast(broadcast) => {
            // Our own messages are already in the log from the optimistic update.
            if broadcast.sender_id == user_id {
                tracing::debug!("skipping echo of own message");
                return Ok(None);
            }
            let message = ChatMessage::from_broadcast(&broadcast);
            lock(log).append(message.clone())?;
            Ok(Some(ChatEvent::MessageReceived(message)))
        }
        Packet::ChatMessageAck(ack) => {
            let status = if ack.success {
                DeliveryStatus::Sent
            } else {
                DeliveryStatus::Failed
            };
            let updated = lock(log).set_status(&ack.message_id, status);
            match updated {
                Ok(()) => Ok(Some(ChatEvent::MessageSent {
                    message_id: ack.message_id,
                    success: ack.success,
                    error: ack.error,
                })),
                Err(Error::UnknownMessageId(message_id)) => {
                    tracing::debug!(%message_id, success = ack.success, "dropping acknowledgment for unknown message");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }
        Packet::UserJoin(user) => Ok(Some(ChatEvent::UserJoined(user))),
        Packet::UserLeave(user) => Ok(Some(ChatEvent::UserLeft(user))),
        Packet::Ping(heartbeat) => {
            transport.send(Packet::Pong(heartbeat)).await?;
            Ok(None)
        }
        Packet::Pong(_) => Ok(None),
        Packet::ChatMessage(_) => {
            tracing::debug!("ignoring client-bound chat message packet");
            Ok(None)
        }
    }
}
