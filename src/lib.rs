mod codec;
mod config;
mod error;
mod message;
mod packet;
mod session;
mod transport;

pub use codec::{FRAME_HEADER_SIZE, MAX_FRAME_SIZE, decode_packet, encode_packet};
pub use config::ChatConfig;
pub use error::Error;
pub use message::{ChatMessage, DeliveryStatus};
pub use packet::*;
pub use session::{ChatEvent, ChatLog, ChatSession};
pub use transport::{
    ConnectionState, MockOptions, MockTransport, TcpTransport, Transport, TransportEvent,
};
