use anyhow::Result;

use crate::packet::ChatBroadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Appended locally, waiting for the server acknowledgment.
    Pending,
    /// Acknowledged by the server.
    Sent,
    /// Received from another party.
    Delivered,
    /// Rejected by the server or never handed to the transport.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub is_own: bool,
    pub status: DeliveryStatus,
}

impl ChatMessage {
    /// A message written by the local user, not yet acknowledged.
    pub fn outgoing(sender_id: &str, sender_name: &str, content: &str) -> Result<Self> {
        Ok(Self {
            id: new_message_id(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            timestamp: now_millis()?,
            is_own: true,
            status: DeliveryStatus::Pending,
        })
    }

    /// A message relayed from another party.
    pub fn from_broadcast(packet: &ChatBroadcast) -> Self {
        Self {
            id: new_message_id(),
            sender_id: packet.sender_id.clone(),
            sender_name: packet.sender_name.clone(),
            content: packet.message.clone(),
            timestamp: packet.timestamp,
            is_own: false,
            status: DeliveryStatus::Delivered,
        }
    }
}

pub(crate) fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `user_` followed by eight hex characters.
pub(crate) fn generate_user_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("user_{}", &id[..8])
}

pub(crate) fn now_millis() -> Result<u64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_millis() as u64)
}
