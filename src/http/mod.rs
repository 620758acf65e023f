//! HTTP front door.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → POST /message: raw body → transport::Relay → 302 to /
//!     → GET: site.rs (pages, static files, 404 page)
//! ```

pub mod request;
pub mod server;
pub mod site;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use site::Site;
