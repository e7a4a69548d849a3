use bytes::{BufMut, BytesMut};
use chat_client_core::*;

fn ack() -> Packet {
    Packet::ChatMessageAck(ChatMessageAck {
        message_id: "3f2a".to_string(),
        success: false,
        error: Some("too long".to_string()),
    })
}

#[test]
fn test_header_carries_stable_tag() -> anyhow::Result<()> {
    let packets = [
        (Packet::Ping(Heartbeat { timestamp: 1 }), 9001u16),
        (Packet::Pong(Heartbeat { timestamp: 1 }), 9002),
        (ack(), 1002),
        (
            Packet::UserJoin(UserPresence {
                user_id: "user_1".to_string(),
                user_name: "One".to_string(),
            }),
            1003,
        ),
    ];
    for (packet, tag) in packets {
        assert_eq!(packet.tag(), tag);
        let mut buffer = BytesMut::new();
        encode_packet(&packet, &mut buffer)?;
        assert_eq!(u16::from_be_bytes([buffer[0], buffer[1]]), tag);
        let len = u32::from_be_bytes([buffer[2], buffer[3], buffer[4], buffer[5]]) as usize;
        assert_eq!(buffer.len(), FRAME_HEADER_SIZE + len);
    }
    Ok(())
}

#[test]
fn test_partial_frames_wait_for_more_data() -> anyhow::Result<()> {
    let mut encoded = BytesMut::new();
    encode_packet(&ack(), &mut encoded)?;
    encode_packet(&Packet::Pong(Heartbeat { timestamp: 7 }), &mut encoded)?;

    let mut buffer = BytesMut::new();
    buffer.put_slice(&encoded[..3]);
    assert_eq!(decode_packet(&mut buffer)?, None);
    buffer.put_slice(&encoded[3..10]);
    assert_eq!(decode_packet(&mut buffer)?, None);
    assert_eq!(buffer.len(), 10);

    buffer.put_slice(&encoded[10..]);
    assert_eq!(decode_packet(&mut buffer)?, Some(ack()));
    assert_eq!(
        decode_packet(&mut buffer)?,
        Some(Packet::Pong(Heartbeat { timestamp: 7 }))
    );
    assert!(buffer.is_empty());
    Ok(())
}

#[test]
fn test_unknown_tag_is_skipped() -> anyhow::Result<()> {
    let mut buffer = BytesMut::new();
    buffer.put_u16(4242);
    buffer.put_u32(3);
    buffer.put_slice(b"???");
    encode_packet(&ack(), &mut buffer)?;

    assert!(matches!(
        decode_packet(&mut buffer),
        Err(Error::UnknownPacketTag(4242))
    ));
    assert_eq!(decode_packet(&mut buffer)?, Some(ack()));
    Ok(())
}

#[test]
fn test_malformed_body_is_skipped() -> anyhow::Result<()> {
    let mut buffer = BytesMut::new();
    buffer.put_u16(TAG_CHAT_BROADCAST);
    buffer.put_u32(1);
    buffer.put_u8(0xff);
    encode_packet(&ack(), &mut buffer)?;

    assert!(matches!(decode_packet(&mut buffer), Err(Error::Codec(_))));
    assert_eq!(decode_packet(&mut buffer)?, Some(ack()));
    Ok(())
}

#[test]
fn test_oversized_frame_is_rejected() {
    let mut buffer = BytesMut::new();
    buffer.put_u16(TAG_CHAT_MESSAGE);
    buffer.put_u32((MAX_FRAME_SIZE + 1) as u32);

    assert!(matches!(
        decode_packet(&mut buffer),
        Err(Error::FrameTooLarge { .. })
    ));
    assert_eq!(buffer.len(), FRAME_HEADER_SIZE);

    let huge = Packet::ChatMessage(ChatMessagePacket {
        message_id: "big".to_string(),
        message: "x".repeat(MAX_FRAME_SIZE),
        timestamp: 0,
    });
    assert!(matches!(
        encode_packet(&huge, &mut BytesMut::new()),
        Err(Error::FrameTooLarge { .. })
    ));
}
