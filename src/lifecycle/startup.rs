//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the relay inbox before the front door so early datagrams land
//! - Start the store writer and/or the HTTP front door as tasks
//! - Hand back the bound addresses and a way to wait for both loops
//!
//! # Design Decisions
//! - Fail fast: a bind error aborts startup before any task runs
//! - The two loops share nothing but the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::RelayConfig;
use crate::error::Result;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::store::JsonFileStore;
use crate::transport::{Relay, UdpInbox, UdpRelay};
use crate::writer::StoreWriter;

/// Which loops this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Front door and store writer in one process.
    #[default]
    All,
    /// HTTP front door only; the writer runs elsewhere.
    FrontDoor,
    /// Store writer only.
    StoreWriter,
}

impl Role {
    fn runs_front_door(self) -> bool {
        matches!(self, Role::All | Role::FrontDoor)
    }

    fn runs_store_writer(self) -> bool {
        matches!(self, Role::All | Role::StoreWriter)
    }
}

/// Handles to started loops.
pub struct Running {
    /// Address the HTTP server is listening on.
    pub http_addr: Option<SocketAddr>,
    /// Address the store writer receives datagrams on.
    pub inbox_addr: Option<SocketAddr>,
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl Running {
    /// Wait for every started loop to finish.
    ///
    /// The first loop to fail triggers `shutdown` so the other one stops
    /// too; that first error is returned.
    pub async fn wait(mut self, shutdown: &Shutdown) -> Result<()> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok((name, Ok(()))) => {
                    tracing::debug!(task = name, "Task finished");
                    continue;
                }
                Ok((name, Err(e))) => {
                    tracing::error!(task = name, error = %e, "Task failed");
                    e
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task panicked");
                    e.into()
                }
            };
            shutdown.trigger();
            first_error.get_or_insert(outcome);
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Bind sockets and spawn the loops for `role`.
pub async fn start(config: &RelayConfig, role: Role, shutdown: &Shutdown) -> Result<Running> {
    let mut running = Running {
        http_addr: None,
        inbox_addr: None,
        tasks: JoinSet::new(),
    };

    if role.runs_store_writer() {
        let inbox = UdpInbox::bind(&config.transport).await?;
        running.inbox_addr = Some(inbox.local_addr()?);

        let store = Arc::new(JsonFileStore::new(&config.storage.path));
        tracing::info!(path = %store.path().display(), "Document store ready");

        let writer = StoreWriter::new(inbox, store);
        let rx = shutdown.subscribe();
        running.tasks.spawn(async move {
            writer.run(rx).await;
            ("store-writer", Ok(()))
        });
    }

    if role.runs_front_door() {
        // In a single process the front door sends wherever the inbox
        // actually bound, which matters when the configured port is 0.
        let relay = match running.inbox_addr {
            Some(addr) => UdpRelay::to_target(addr).await?,
            None => UdpRelay::connect(&config.transport).await?,
        };
        tracing::info!(target_addr = %relay.target(), "Front door relays to store writer");

        let listener = TcpListener::bind(&config.http.bind_address).await?;
        running.http_addr = Some(listener.local_addr()?);

        let relay: Arc<dyn Relay> = Arc::new(relay);
        let server = HttpServer::new(config.clone(), relay);
        let rx = shutdown.subscribe();
        running.tasks.spawn(async move {
            let result = server.run(listener, rx).await.map_err(crate::Error::from);
            ("http-server", result)
        });
    }

    Ok(running)
}

/// Start `role`, stop on SIGINT/SIGTERM, and wait for the loops to end.
pub async fn run(config: RelayConfig, role: Role) -> Result<()> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let running = start(&config, role, &shutdown).await?;
    let signals = shutdown.trigger_on_signal();

    let result = running.wait(&shutdown).await;
    signals.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_config(dir: &tempfile::TempDir) -> RelayConfig {
        let mut config = RelayConfig::default();
        config.http.bind_address = "127.0.0.1:0".to_string();
        config.transport.address = "127.0.0.1:0".to_string();
        config.storage.path = dir.path().join("data.json").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_role_selection() {
        assert!(Role::All.runs_front_door() && Role::All.runs_store_writer());
        assert!(Role::FrontDoor.runs_front_door() && !Role::FrontDoor.runs_store_writer());
        assert!(!Role::StoreWriter.runs_front_door() && Role::StoreWriter.runs_store_writer());
    }

    #[tokio::test]
    async fn test_start_binds_requested_loops_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = Shutdown::new();

        let running = start(&loopback_config(&dir), Role::StoreWriter, &shutdown).await.unwrap();
        assert!(running.http_addr.is_none());
        assert!(running.inbox_addr.is_some());

        shutdown.trigger();
        running.wait(&shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut config = loopback_config(&dir);
        config.transport.address = taken.local_addr().unwrap().to_string();

        let result = start(&config, Role::StoreWriter, &Shutdown::new()).await;
        assert!(matches!(result, Err(crate::Error::Transport(_))));
    }
}
