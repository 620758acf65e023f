//! Form intake relay.
//!
//! An HTTP front door accepts form posts and forwards each raw body as a
//! UDP datagram. A separate store writer receives the datagrams, parses
//! them and merges each one into a single JSON document keyed by receipt
//! time.
//!
//! ```text
//!   client ──POST /message──▶ http (front door) ──302──▶ client
//!                                  │
//!                                  ▼ transport (UDP, best effort)
//!                              writer (store writer)
//!                                  │ form::parse, Timestamp::now
//!                                  ▼
//!                              store (storage/data.json)
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod transport;
pub mod writer;

pub use config::schema::RelayConfig;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use writer::StoreWriter;
