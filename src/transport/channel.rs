//! In-process relay over a bounded tokio channel.
//!
//! Same contract as UDP: a full queue drops the payload instead of
//! applying backpressure to the front door.

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::mpsc;

use super::{Inbox, Relay, TransportError};

/// Create a connected relay/inbox pair holding at most `capacity` payloads.
pub fn channel(capacity: usize) -> (ChannelRelay, ChannelInbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelRelay { tx }, ChannelInbox { rx })
}

/// Sending half of an in-process relay.
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    tx: mpsc::Sender<Bytes>,
}

#[async_trait]
impl Relay for ChannelRelay {
    async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Receiving half of an in-process relay.
#[derive(Debug)]
pub struct ChannelInbox {
    rx: mpsc::Receiver<Bytes>,
}

#[async_trait]
impl Inbox for ChannelInbox {
    async fn recv(&mut self) -> Result<Bytes, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}
