//! Datagram transport between the front door and the store writer.
//!
//! # Data Flow
//! ```text
//! POST body
//!     → Relay::send (udp.rs: one datagram to the fixed writer address)
//!     → Inbox::recv (udp.rs: bound socket, fixed receive buffer)
//!     → store writer
//! ```
//!
//! # Design Decisions
//! - Best effort only: no acknowledgment, no retries, no ordering
//! - A send the OS accepts counts as delivered
//! - Both ends sit behind traits; channel.rs is an in-process drop-in

pub mod channel;
pub mod udp;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub use channel::{channel, ChannelInbox, ChannelRelay};
pub use udp::{UdpInbox, UdpRelay};

/// Errors raised by transport endpoints.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind a socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured address does not parse.
    #[error("invalid transport address '{0}'")]
    InvalidAddress(String),

    /// Sending a payload failed at the socket layer.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// Receiving a datagram failed at the socket layer.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// The payload was dropped because the in-process queue is full.
    #[error("relay queue full, payload dropped")]
    Full,

    /// The other end is gone.
    #[error("transport closed")]
    Closed,
}

/// Producer side: forwards one opaque payload per submission.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Hand a payload to the transport. Success means the transport
    /// accepted it, not that anyone processed it.
    async fn send(&self, payload: Bytes) -> Result<(), TransportError>;
}

/// Consumer side: yields payloads in whatever order they arrive.
#[async_trait]
pub trait Inbox: Send {
    /// Wait for the next payload.
    async fn recv(&mut self) -> Result<Bytes, TransportError>;
}
