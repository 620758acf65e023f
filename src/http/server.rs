//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with page, submission and static handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Relay submission bodies to the store writer and redirect
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, get_service},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::site::Site;
use crate::observability::metrics;
use crate::transport::Relay;

/// Application state injected into handlers.
///
/// The front door only holds the sending half of the relay; it has no
/// handle on the document store.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<dyn Relay>,
}

/// HTTP front door.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server that forwards submissions through `relay`.
    pub fn new(config: RelayConfig, relay: Arc<dyn Relay>) -> Self {
        let site = Site::from_config(&config.site);
        let router = Self::build_router(&config, &site, AppState { relay });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, site: &Site, state: AppState) -> Router {
        Router::new()
            .route("/", get_service(site.index()))
            .route("/message", get_service(site.message()).post(submit_message))
            .route("/healthz", get(healthz))
            .fallback_service(site.static_files())
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.http.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.http.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// A clone of the router, for driving the front door without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            site_root = %self.config.site.root,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward the raw body to the store writer and send the client home.
///
/// The body is not inspected. Whatever happens to it afterwards, the
/// client gets the same redirect; a body that could not be read (over
/// `http.max_body_size`, or cut off) is dropped here instead.
async fn submit_message(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let redirect = (StatusCode::FOUND, [(header::LOCATION, "/")]);

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            metrics::record_submission(false);
            tracing::warn!(status = %e.status(), error = %e, "Unreadable submission body dropped");
            return redirect;
        }
    };
    let len = body.len();

    match state.relay.send(body).await {
        Ok(()) => {
            metrics::record_submission(true);
            tracing::debug!(len, "Submission relayed");
        }
        Err(e) => {
            metrics::record_submission(false);
            tracing::warn!(len, error = %e, "Relay send failed, submission lost");
        }
    }

    redirect
}

async fn healthz() -> &'static str {
    "ok"
}
