//! Network packets
//!
//! Every packet kind carries a stable numeric tag, which is also the frame
//! header used on the wire.

use serde::{Deserialize, Serialize};

// --- Packet Tags ---
pub const TAG_CHAT_MESSAGE: u16 = 1001;
pub const TAG_CHAT_MESSAGE_ACK: u16 = 1002;
pub const TAG_USER_JOIN: u16 = 1003;
pub const TAG_USER_LEAVE: u16 = 1004;
pub const TAG_CHAT_BROADCAST: u16 = 1005;
pub const TAG_PING: u16 = 9001;
pub const TAG_PONG: u16 = 9002;

/// Outbound chat message, sent to the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessagePacket {
    pub message_id: String,
    pub message: String,
    pub timestamp: u64,
}

/// Server acknowledgment for a [`ChatMessagePacket`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageAck {
    pub message_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// A chat message relayed by the server on behalf of some sender.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatBroadcast {
    pub sender_id: String,
    pub sender_name: String,
    pub message: String,
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: String,
    pub user_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ChatMessage(ChatMessagePacket),
    ChatMessageAck(ChatMessageAck),
    ChatBroadcast(ChatBroadcast),
    UserJoin(UserPresence),
    UserLeave(UserPresence),
    Ping(Heartbeat),
    Pong(Heartbeat),
}

impl Packet {
    /// The stable wire tag for this packet kind.
    pub fn tag(&self) -> u16 {
        match self {
            Packet::ChatMessage(_) => TAG_CHAT_MESSAGE,
            Packet::ChatMessageAck(_) => TAG_CHAT_MESSAGE_ACK,
            Packet::ChatBroadcast(_) => TAG_CHAT_BROADCAST,
            Packet::UserJoin(_) => TAG_USER_JOIN,
            Packet::UserLeave(_) => TAG_USER_LEAVE,
            Packet::Ping(_) => TAG_PING,
            Packet::Pong(_) => TAG_PONG,
        }
    }

    /// Short name used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::ChatMessage(_) => "chat_message",
            Packet::ChatMessageAck(_) => "chat_message_ack",
            Packet::ChatBroadcast(_) => "chat_broadcast",
            Packet::UserJoin(_) => "user_join",
            Packet::UserLeave(_) => "user_leave",
            Packet::Ping(_) => "ping",
            Packet::Pong(_) => "pong",
        }
    }
}
