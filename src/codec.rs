//! Packet framing
//!
//! `tag: u16 | len: u32 | body`, big-endian header, postcard body.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};

use crate::Error;
use crate::packet::*;

pub const FRAME_HEADER_SIZE: usize = 6;
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Append one framed packet to `dst`.
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) -> Result<(), Error> {
    let body = match packet {
        Packet::ChatMessage(p) => to_body(p)?,
        Packet::ChatMessageAck(p) => to_body(p)?,
        Packet::ChatBroadcast(p) => to_body(p)?,
        Packet::UserJoin(p) | Packet::UserLeave(p) => to_body(p)?,
        Packet::Ping(p) | Packet::Pong(p) => to_body(p)?,
    };
    if body.len() > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    dst.reserve(FRAME_HEADER_SIZE + body.len());
    dst.put_u16(packet.tag());
    dst.put_u32(body.len() as u32);
    dst.put_slice(&body);
    Ok(())
}

/// Take the next complete packet off the front of `src`.
///
/// Returns `Ok(None)` while the frame is still incomplete. A frame with an
/// unknown tag or a malformed body is consumed before the error is returned,
/// so the caller may keep decoding. [`Error::FrameTooLarge`] leaves the buffer
/// untouched and the stream should be dropped.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>, Error> {
    if src.len() < FRAME_HEADER_SIZE {
        return Ok(None);
    }
    let tag = u16::from_be_bytes([src[0], src[1]]);
    let len = u32::from_be_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }
    if src.len() < FRAME_HEADER_SIZE + len {
        src.reserve(FRAME_HEADER_SIZE + len - src.len());
        return Ok(None);
    }
    src.advance(FRAME_HEADER_SIZE);
    let body = src.split_to(len);

    let packet = match tag {
        TAG_CHAT_MESSAGE => Packet::ChatMessage(from_body(&body)?),
        TAG_CHAT_MESSAGE_ACK => Packet::ChatMessageAck(from_body(&body)?),
        TAG_CHAT_BROADCAST => Packet::ChatBroadcast(from_body(&body)?),
        TAG_USER_JOIN => Packet::UserJoin(from_body(&body)?),
        TAG_USER_LEAVE => Packet::UserLeave(from_body(&body)?),
        TAG_PING => Packet::Ping(from_body(&body)?),
        TAG_PONG => Packet::Pong(from_body(&body)?),
        other => return Err(Error::UnknownPacketTag(other)),
    };
    Ok(Some(packet))
}

fn to_body<T: Serialize>(payload: &T) -> Result<Vec<u8>, Error> {
    Ok(postcard::to_stdvec(payload)?)
}

fn from_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    Ok(postcard::from_bytes(body)?)
}
