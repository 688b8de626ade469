//! Test helpers: build AppState and router for integration tests against a temporary
//! storage directory.

#![allow(dead_code)]

use axum_test::TestServer;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use streamdrop_api::constants;
use streamdrop_api::setup::{routes, services};
use streamdrop_api::state::AppState;
use streamdrop_core::config::ServerConfig;
use streamdrop_core::{Config, Token};
use tempfile::TempDir;
use tokio::io::AsyncRead;

pub const BASE_URL: &str = "http://streams.test";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and the owned storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.state.config.storage_dir().to_path_buf()
    }

    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.storage_dir()).unwrap().count()
    }

    /// Write `data` into storage and register it for `owner_id`, as ingestion would.
    pub async fn register_file(&self, owner_id: &str, data: &[u8], content_type: &str) -> Token {
        let path = self.state.storage.allocate_path("mp4");
        let reader: Pin<Box<dyn AsyncRead + Send + Unpin>> =
            Box::pin(std::io::Cursor::new(data.to_vec()));
        self.state
            .storage
            .write_stream(&path, reader, u64::MAX)
            .await
            .expect("Failed to write test file");
        self.state.registry.register(owner_id, path, content_type).await
    }
}

pub fn test_config(storage_dir: PathBuf) -> Config {
    Config::from(ServerConfig {
        base_url: BASE_URL.to_string(),
        storage_dir,
        expiry: Duration::from_secs(60 * 60),
        max_ingest_size_bytes: 1024 * 1024,
        ingest_timeout: Duration::from_secs(10),
        allow_private_urls: true,
        ..ServerConfig::default()
    })
}

/// Setup test app with isolated local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(temp_dir.path().join("storage"));

    let state = services::initialize_services(&config)
        .await
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// Bytes 0..len with a repeating, position-dependent pattern.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
