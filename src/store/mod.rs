//! Document store subsystem.
//!
//! # Data Flow
//! ```text
//! parsed FormFields + receipt Timestamp
//!     → DocumentStore::append
//!         → load (whole document, empty if absent)
//!         → Document::insert (unique timestamp key)
//!         → save (whole document overwritten)
//! ```
//!
//! # Design Decisions
//! - All access goes through `DocumentStore`, so an atomic-rename or
//!   append-log backend only replaces `json_file.rs`
//! - No locking: exactly one writer exists by construction
//! - A failed append leaves the file as it was before the call

pub mod document;
pub mod json_file;

use std::path::PathBuf;

use thiserror::Error;

use crate::form::FormFields;

pub use document::{Document, Timestamp};
pub use json_file::JsonFileStore;

/// Errors raised while reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("existing document at {path} is not a valid JSON object: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Outcome of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Key the entry was stored under.
    pub key: String,
    /// Entries in the document after the append.
    pub total_entries: usize,
}

/// Read/write access to the persisted document.
pub trait DocumentStore: Send + Sync {
    /// Read the whole document; a store that does not exist yet is empty.
    fn load(&self) -> Result<Document, StoreError>;

    /// Replace the stored document with `document`.
    fn save(&self, document: &Document) -> Result<(), StoreError>;

    /// Read-modify-write one entry into the document.
    fn append(&self, stamp: Timestamp, fields: FormFields) -> Result<Appended, StoreError> {
        let mut document = self.load()?;
        let key = document.insert(stamp, fields);
        self.save(&document)?;
        Ok(Appended {
            key,
            total_entries: document.len(),
        })
    }
}
