//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use form_relay::config::RelayConfig;
use form_relay::lifecycle::{self, Role, Running};
use form_relay::store::{Document, DocumentStore, JsonFileStore};
use form_relay::Shutdown;
use tempfile::TempDir;

/// A relay running on loopback with its own scratch directory.
pub struct TestRelay {
    _dir: TempDir,
    pub config: RelayConfig,
    pub http_addr: SocketAddr,
    pub inbox_addr: SocketAddr,
    pub shutdown: Shutdown,
    running: Running,
}

impl TestRelay {
    /// Start front door and store writer with pages and a stylesheet in place.
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("assets");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("index.html"), "<h1>Home</h1>").unwrap();
        fs::write(site.join("message.html"), "<form method=\"post\"></form>").unwrap();
        fs::write(site.join("error.html"), "<h1>Not found</h1>").unwrap();
        fs::write(site.join("style.css"), "body { margin: 0; }").unwrap();

        let mut config = RelayConfig::default();
        config.http.bind_address = "127.0.0.1:0".to_string();
        config.transport.address = "127.0.0.1:0".to_string();
        config.site.root = site.to_string_lossy().into_owned();
        config.storage.path = dir
            .path()
            .join("storage")
            .join("data.json")
            .to_string_lossy()
            .into_owned();

        let shutdown = Shutdown::new();
        let running = lifecycle::start(&config, Role::All, &shutdown).await.unwrap();

        Self {
            http_addr: running.http_addr.unwrap(),
            inbox_addr: running.inbox_addr.unwrap(),
            _dir: dir,
            config,
            shutdown,
            running,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.storage_path())
    }

    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.path)
    }

    /// Poll the document until it holds `count` entries or time runs out.
    pub async fn wait_for_entries(&self, count: usize) -> Document {
        let store = self.store();
        for _ in 0..100 {
            if let Ok(doc) = store.load() {
                if doc.len() >= count {
                    return doc;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        store.load().unwrap()
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.running.wait(&self.shutdown))
            .await
            .expect("relay did not stop")
            .unwrap();
    }
}

/// HTTP client that does not follow redirects or use system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
