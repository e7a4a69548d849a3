use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not connected.")]
    NotConnected,
    #[error("no message with id '{0}' in the log.")]
    UnknownMessageId(String),
    #[error("a message with id '{0}' is already in the log.")]
    DuplicateMessageId(String),
    #[error("unknown packet tag {0}.")]
    UnknownPacketTag(u16),
    #[error("frame of {len} bytes exceeds the {max} byte limit.")]
    FrameTooLarge { len: usize, max: usize },
    #[error("connection timed out.")]
    Timeout,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Codec(#[from] postcard::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
