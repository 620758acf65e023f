//! UDP implementation of the relay transport.
//!
//! # Responsibilities
//! - Bind the writer's fixed receive address
//! - Send each submission as one datagram to that address
//! - Enforce the fixed receive buffer (the OS truncates anything longer)

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::net::UdpSocket;

use super::{Inbox, Relay, TransportError};
use crate::config::TransportConfig;

fn parse_addr(address: &str) -> Result<SocketAddr, TransportError> {
    address
        .parse()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))
}

async fn bind(addr: SocketAddr) -> Result<UdpSocket, TransportError> {
    UdpSocket::bind(addr).await.map_err(|source| TransportError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Sending half, owned by the front door.
///
/// One ephemeral socket is shared by all handlers; `send_to` only needs `&self`.
#[derive(Debug)]
pub struct UdpRelay {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpRelay {
    /// Bind an ephemeral local socket that sends to the configured writer address.
    pub async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let target = parse_addr(&config.address)?;
        Self::to_target(target).await
    }

    /// Bind an ephemeral local socket that sends to `target`.
    pub async fn to_target(target: SocketAddr) -> Result<Self, TransportError> {
        let local = match target.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = bind(local).await?;

        tracing::debug!(target_addr = %target, "Relay socket ready");
        Ok(Self { socket, target })
    }

    /// Address datagrams are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl Relay for UdpRelay {
    async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        self.socket
            .send_to(&payload, self.target)
            .await
            .map_err(TransportError::Send)?;
        Ok(())
    }
}

/// Receiving half, owned by the store writer.
#[derive(Debug)]
pub struct UdpInbox {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl UdpInbox {
    /// Bind the writer's receive address from configuration.
    pub async fn bind(config: &TransportConfig) -> Result<Self, TransportError> {
        let addr = parse_addr(&config.address)?;
        let socket = bind(addr).await?;
        Ok(Self::from_socket(socket, config.buffer_size))
    }

    /// Wrap an already bound socket.
    pub fn from_socket(socket: UdpSocket, buffer_size: usize) -> Self {
        if let Ok(addr) = socket.local_addr() {
            tracing::info!(address = %addr, buffer_size, "Relay inbox bound");
        }
        Self {
            socket,
            buffer: vec![0; buffer_size],
        }
    }

    /// Local address of the receive socket.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl Inbox for UdpInbox {
    async fn recv(&mut self) -> Result<Bytes, TransportError> {
        let (len, peer) = self
            .socket
            .recv_from(&mut self.buffer)
            .await
            .map_err(TransportError::Receive)?;

        tracing::trace!(peer = %peer, len, "Datagram received");
        Ok(Bytes::copy_from_slice(&self.buffer[..len]))
    }
}
