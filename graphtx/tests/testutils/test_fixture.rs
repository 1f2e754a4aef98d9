//! Test fixture for GraphTx integration tests
//!
//! Uses only the public API. The backend handle is shared with the engine,
//! so its journal reflects everything the engine did.

#![allow(dead_code)]

use graphtx::{
    BackendEvent, EngineConfig, MemoryBackend, QueryEngine, Session, StatsSnapshot, Value,
};

/// Engine plus the backend it talks to
pub struct TestFixture {
    pub engine: QueryEngine,
    pub backend: MemoryBackend,
}

impl TestFixture {
    /// Fixture with the default (auto-begin) configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Fixture that rejects queries outside a transaction
    pub fn strict() -> Self {
        Self::with_config(EngineConfig::strict())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        init_logging();
        let backend = MemoryBackend::new();
        let engine = QueryEngine::with_config(backend.clone(), config)
            .expect("Failed to create engine");
        Self { engine, backend }
    }

    /// Fixture whose backend already answers the person queries used in tests
    pub fn with_people() -> Self {
        let fixture = Self::new();
        fixture
            .backend
            .respond(
                r"^MATCH \(p:Person\)",
                &["name", "age"],
                vec![
                    vec![Value::from("Ada"), Value::from(36)],
                    vec![Value::from("Alan"), Value::from(41)],
                    vec![Value::from("Grace"), Value::from(85)],
                ],
            )
            .expect("Failed to script backend");
        fixture
    }

    pub fn session(&self) -> Session {
        self.engine.session()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.engine.stats()
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.backend.events()
    }

    /// Assert that every acquired connection has been closed
    pub fn assert_no_leaks(&self) {
        assert_eq!(
            self.backend.open_connections(),
            0,
            "backend still has live connections: {:?}",
            self.backend.live_connections()
        );
        assert_eq!(self.stats().open_connections(), 0);
    }
}

/// Install the test logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
