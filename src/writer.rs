//! Store writer: the relay listener that owns the document.
//!
//! # Responsibilities
//! - Receive one payload at a time from the inbox
//! - Parse, stamp and append it to the document store
//! - Log and count every dropped submission, then keep going
//!
//! # Design Decisions
//! - Strictly sequential: the next payload is not taken until the current
//!   append has finished, so entries land in receipt order
//! - File I/O runs on the blocking pool but is awaited in line
//! - No failure of a single payload ends the loop; only shutdown does

use std::sync::Arc;

use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::form::{self, ParseError};
use crate::observability::metrics;
use crate::store::{Appended, DocumentStore, StoreError, Timestamp};
use crate::transport::{Inbox, TransportError};

/// Why one payload was dropped.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("malformed submission: {0}")]
    Parse(#[from] ParseError),

    #[error("could not persist submission: {0}")]
    Store(#[from] StoreError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The single writer of the document store.
pub struct StoreWriter<I, S> {
    inbox: I,
    store: Arc<S>,
}

impl<I, S> StoreWriter<I, S>
where
    I: Inbox,
    S: DocumentStore + 'static,
{
    pub fn new(inbox: I, store: Arc<S>) -> Self {
        Self { inbox, store }
    }

    /// Parse, stamp and append one payload.
    pub async fn process(&self, payload: Bytes) -> Result<Appended, WriterError> {
        let stamp = Timestamp::now();
        let fields = form::parse(&payload)?;
        tracing::debug!(fields = fields.len(), "Payload parsed");

        let store = Arc::clone(&self.store);
        let appended = tokio::task::spawn_blocking(move || store.append(stamp, fields)).await??;
        Ok(appended)
    }

    /// Process one payload, logging the outcome instead of returning it.
    pub async fn handle(&self, payload: Bytes) {
        match self.process(payload.clone()).await {
            Ok(appended) => {
                metrics::record_persisted(appended.total_entries);
                tracing::info!(
                    key = %appended.key,
                    total_entries = appended.total_entries,
                    "Submission stored"
                );
            }
            Err(WriterError::Parse(e)) => {
                metrics::record_parse_failure();
                tracing::error!(
                    payload = %String::from_utf8_lossy(&payload),
                    error = %e,
                    "Field parse failed, submission dropped"
                );
            }
            Err(e) => {
                metrics::record_store_failure();
                tracing::error!(
                    payload = %String::from_utf8_lossy(&payload),
                    error = %e,
                    "Field write failed, submission dropped"
                );
            }
        }
    }

    /// Receive and store payloads until shutdown or until the inbox closes.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Store writer starting");

        loop {
            let received = tokio::select! {
                res = self.inbox.recv() => res,
                _ = shutdown.recv() => {
                    tracing::info!("Store writer received shutdown signal, exiting loop");
                    break;
                }
            };

            match received {
                Ok(payload) => self.handle(payload).await,
                Err(TransportError::Closed) => {
                    tracing::warn!("Relay inbox closed, store writer stopping");
                    break;
                }
                Err(e) => tracing::error!(error = %e, "Relay receive failed"),
            }
        }

        tracing::info!("Store writer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use crate::transport::{channel, ChannelInbox, Relay};
    use std::time::Duration;

    fn writer_in(dir: &tempfile::TempDir) -> (StoreWriter<ChannelInbox, JsonFileStore>, Arc<JsonFileStore>) {
        let store = Arc::new(JsonFileStore::new(dir.path().join("storage/data.json")));
        let (_relay, inbox) = channel(8);
        (StoreWriter::new(inbox, Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_valid_payload_adds_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, store) = writer_in(&dir);

        let appended = writer.process(Bytes::from_static(b"name=Ann&city=Lviv")).await.unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.len(), 1);
        let entry = doc.get(&appended.key).unwrap();
        assert_eq!(entry, &serde_json::json!({"name": "Ann", "city": "Lviv"}));
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, store) = writer_in(&dir);
        writer.process(Bytes::from_static(b"k1=v1")).await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let err = writer.process(Bytes::from_static(b"k1=v1&bad")).await.unwrap_err();
        assert!(matches!(err, WriterError::Parse(_)));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_malformed_payload_on_empty_store_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, store) = writer_in(&dir);
        writer.handle(Bytes::from_static(b"bad")).await;
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_same_fields_twice_gives_two_entries() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, store) = writer_in(&dir);

        let first = writer.process(Bytes::from_static(b"name=Ann")).await.unwrap();
        let second = writer.process(Bytes::from_static(b"name=Bob")).await.unwrap();

        assert_ne!(first.key, second.key);
        let doc = store.load().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get(&first.key).unwrap()["name"], "Ann");
        assert_eq!(doc.get(&second.key).unwrap()["name"], "Bob");
    }

    #[tokio::test]
    async fn test_corrupt_store_drops_submission() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, store) = writer_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        let err = writer.process(Bytes::from_static(b"a=1")).await.unwrap_err();
        assert!(matches!(err, WriterError::Store(StoreError::Decode { .. })));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_run_survives_bad_payload_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("data.json")));
        let (relay, inbox) = channel(8);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(StoreWriter::new(inbox, Arc::clone(&store)).run(shutdown_rx));

        relay.send(Bytes::from_static(b"bad")).await.unwrap();
        relay.send(Bytes::from_static(b"a=1")).await.unwrap();

        let mut stored = 0;
        for _ in 0..50 {
            stored = store.load().map(|d| d.len()).unwrap_or(0);
            if stored == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(stored, 1);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("writer did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_when_inbox_closes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("data.json")));
        let (relay, inbox) = channel(1);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        drop(relay);
        tokio::time::timeout(
            Duration::from_secs(2),
            StoreWriter::new(inbox, store).run(shutdown_rx),
        )
        .await
        .expect("writer did not stop");
    }
}
