//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → bind inbox → spawn writer → bind HTTP → spawn front door
//!
//! Shutdown (shutdown.rs):
//!     Signal or trigger → both loops observe broadcast → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, start, Role, Running};
