//! Liveness check of the peer-to-peer (noise) port.
//!
//! We only go as far as sending the first handshake message: a node speaking
//! the noise protocol either waits for more, replies with a binary frame, or
//! drops us because it cannot authenticate the initiator. Anything answering
//! with text (an HTTP server, a banner) is on the wrong protocol.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use x25519_dalek::{EphemeralSecret, PublicKey};

use super::{DataKind, FetchFailure, FetchOutcome, FetchedData, Fetcher, with_timeout};
use crate::address::NodeAddress;

/// Size of an IK initiation message: ephemeral key, sealed static key, sealed timestamp.
pub const INITIATION_LEN: usize = 32 + (32 + 16) + (8 + 16);

const DEFAULT_READ_WINDOW: Duration = Duration::from_millis(500);

/// How the remote end reacted to our initiation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerReaction {
    /// Closed or reset the connection after reading the message
    Closed,
    /// Sent back a binary frame of this many bytes
    Replied { bytes: usize },
    /// Kept the connection open waiting for more
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeData {
    pub remote: SocketAddr,
    /// Time to connect and deliver the initiation message
    pub latency: Duration,
    pub reaction: PeerReaction,
}

/// Build a length prefixed initiation frame around a fresh ephemeral key.
pub fn initiation_frame() -> Vec<u8> {
    let secret = EphemeralSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);

    let mut frame = Vec::with_capacity(2 + INITIATION_LEN);
    frame.extend_from_slice(&(INITIATION_LEN as u16).to_be_bytes());
    frame.extend_from_slice(public.as_bytes());
    frame.resize(2 + INITIATION_LEN, 0);
    frame
}

fn looks_like_text(reply: &[u8]) -> bool {
    reply.starts_with(b"HTTP/")
        || reply.iter().all(|b| b.is_ascii_graphic() || b.is_ascii_whitespace())
}

/// Opens a TCP connection to the noise port and sends one handshake message.
pub struct HandshakeFetcher {
    read_window: Duration,
}

impl Default for HandshakeFetcher {
    fn default() -> Self {
        Self { read_window: DEFAULT_READ_WINDOW }
    }
}

impl HandshakeFetcher {
    /// How long to wait for the peer's reaction after sending the message.
    pub fn with_read_window(read_window: Duration) -> Self {
        Self { read_window }
    }

    async fn handshake(&self, address: &NodeAddress, timeout: Duration) -> FetchOutcome<HandshakeData> {
        let connection_failure = |e: std::io::Error| FetchFailure::Connection {
            kind: DataKind::Handshake,
            cause: e.to_string(),
        };

        let host = address.host();
        debug!("Opening handshake with {} port {}", host, address.noise_port);
        let start = Instant::now();

        let mut stream = TcpStream::connect((host.as_str(), address.noise_port))
            .await
            .map_err(connection_failure)?;
        let remote = stream.peer_addr().map_err(connection_failure)?;

        stream.write_all(&initiation_frame()).await.map_err(connection_failure)?;
        let latency = start.elapsed();

        // Leave room inside the fetch timeout for the read window.
        let window = self.read_window.min(timeout / 2);
        let mut reply = [0u8; 64];

        let reaction = match tokio::time::timeout(window, stream.read(&mut reply)).await {
            Err(_) => PeerReaction::Silent,
            Ok(Ok(0)) => PeerReaction::Closed,
            Ok(Ok(n)) if looks_like_text(&reply[..n]) => {
                return Err(FetchFailure::Parse {
                    kind: DataKind::Handshake,
                    cause: format!(
                        "port answered with text ({:?}), not the noise protocol",
                        String::from_utf8_lossy(&reply[..n.min(16)])
                    ),
                });
            }
            Ok(Ok(n)) => PeerReaction::Replied { bytes: n },
            Ok(Err(e))
                if matches!(
                    e.kind(),
                    ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
                ) =>
            {
                PeerReaction::Closed
            }
            Ok(Err(e)) => return Err(connection_failure(e)),
        };

        let _ = stream.shutdown().await;
        Ok(HandshakeData { remote, latency, reaction })
    }
}

#[async_trait::async_trait]
impl Fetcher for HandshakeFetcher {
    fn kind(&self) -> DataKind {
        DataKind::Handshake
    }

    async fn fetch(&self, address: &NodeAddress, timeout: Duration) -> FetchedData {
        FetchedData::Handshake(
            with_timeout(DataKind::Handshake, timeout, self.handshake(address, timeout)).await,
        )
    }
}
