//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! front door, store writer
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Every dropped submission is logged and counted; the client never sees it
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
