//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs against the in-memory session store and local storage in a
//! temporary directory, with a manual clock so expiry can be exercised.

pub mod fixtures;

use axum_test::TestServer;
use handoff_api::constants;
use handoff_api::setup::{routes, services};
use handoff_core::{Config, HandoffConfig, ManualClock};
use handoff_db::InMemorySessionStore;
use handoff_services::{LocalStorage, Storage};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

pub const PUBLIC_ORIGIN: &str = "http://handoff.test";
pub const MAX_FILES: usize = 3;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, clock and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub clock: ManualClock,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(storage_path: &str) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SESSION_STORE", "memory".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", storage_path.to_string()),
        ("PUBLIC_ORIGIN", PUBLIC_ORIGIN.to_string()),
        ("MAX_FILES_PER_BATCH", MAX_FILES.to_string()),
        ("SESSION_TTL_SECS", "3600".to_string()),
        ("SWEEPER_ENABLED", "false".to_string()),
    ]);
    let config = HandoffConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    Config(Box::new(config))
}

/// Setup test app with in-memory sessions and local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir
        .path()
        .to_str()
        .expect("temp dir path is not UTF-8")
        .to_string();
    let config = create_test_config(&storage_path);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            temp_dir.path().to_path_buf(),
            config.local_storage_base_url().to_string(),
        )
        .await
        .expect("Failed to create local storage"),
    );

    let clock = ManualClock::default();
    let store = Arc::new(InMemorySessionStore::new(
        Arc::new(clock.clone()),
        config.session_ttl(),
    ));

    let state = services::initialize_services(&config, store, storage, Arc::new(clock.clone()));
    let router = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        clock,
        _temp_dir: temp_dir,
    }
}
