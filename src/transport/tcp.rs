use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::{ConnectionState, Notifier, Transport, TransportEvent};
use crate::codec::{decode_packet, encode_packet};
use crate::{ChatConfig, Error, Packet};

const READ_BUFFER_SIZE: usize = 4096;

/// Transport over a plain TCP stream, using the framing in [`crate::codec`].
#[derive(Debug)]
pub struct TcpTransport {
    notifier: Arc<Notifier>,
    connect_timeout: Duration,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    /// Cancels the reader task of the current connection.
    reader: Mutex<Option<CancellationToken>>,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(ChatConfig::default().connect_timeout())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.stop_reader();
    }
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            notifier: Arc::new(Notifier::new()),
            connect_timeout,
            writer: tokio::sync::Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.connect_timeout())
    }

    fn stop_reader(&self) {
        let token = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    fn start_reader(&self, read: OwnedReadHalf) {
        let token = CancellationToken::new();
        let previous = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        tokio::spawn(read_loop(read, self.notifier.clone(), token));
    }
}

impl Transport for TcpTransport {
    async fn connect(&self, host: &str, port: u16) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }
        self.notifier.set_state(
            ConnectionState::Connecting,
            format!("Connecting to {host}:{port}..."),
        );

        let stream = match timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.notifier
                    .set_state(ConnectionState::Error, format!("Connection failed: {e}"));
                return Err(Error::Io(e));
            }
            Err(_) => {
                self.notifier
                    .set_state(ConnectionState::Error, "Connection timed out");
                return Err(Error::Timeout);
            }
        };
        stream.set_nodelay(true)?;

        let (read, write) = stream.into_split();
        *self.writer.lock().await = Some(write);
        self.notifier
            .set_state(ConnectionState::Connected, format!("Connected to {host}:{port}"));
        self.start_reader(read);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        if self.state() == ConnectionState::Disconnected {
            return Ok(());
        }
        self.stop_reader();
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            // The peer may already be gone.
            let _ = writer.shutdown().await;
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
        let mut frame = BytesMut::new();
        encode_packet(&packet, &mut frame)?;

        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(Error::NotConnected);
        };
        if let Err(e) = stream.write_all(&frame).await {
            writer.take();
            self.notifier
                .set_state(ConnectionState::Error, format!("Send failed: {e}"));
            return Err(Error::Io(e));
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

/// Decode frames off the socket until it closes or the token is cancelled.
async fn read_loop(mut read: OwnedReadHalf, notifier: Arc<Notifier>, token: CancellationToken) {
    let mut buffer = BytesMut::with_capacity(READ_BUFFER_SIZE);
    loop {
        loop {
            match decode_packet(&mut buffer) {
                Ok(Some(packet)) => notifier.packet(packet),
                Ok(None) => break,
                Err(e @ Error::FrameTooLarge { .. }) => {
                    notifier.set_state(ConnectionState::Error, format!("Protocol error: {e}"));
                    return;
                }
                Err(e) => tracing::warn!(error = %e, "skipping undecodable frame"),
            }
        }

        tokio::select! {
            _ = token.cancelled() => return,
            result = read.read_buf(&mut buffer) => match result {
                Ok(0) => {
                    notifier.set_state(ConnectionState::Disconnected, "Connection closed by peer");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    notifier.set_state(ConnectionState::Error, format!("Receive failed: {e}"));
                    return;
                }
            }
        }
    }
}
