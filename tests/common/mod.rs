#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use url_redirector::application::services::{AllocatorSettings, CreationSettings};
use url_redirector::domain::alphabet::Alphabet;
use url_redirector::domain::entities::{Mapping, MappingStatus};
use url_redirector::domain::visit_event::VisitEvent;
use url_redirector::infrastructure::persistence::{
    MemoryAliasRepository, MemoryCounterRepository, MemoryMappingRepository,
};
use url_redirector::routes::app_router;
use url_redirector::state::{AppState, Repositories, ServiceSettings};

pub const BASE_URL: &str = "https://s.example.com";

/// In-memory application with direct handles on its stores.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mappings: Arc<MemoryMappingRepository>,
    pub counter: Arc<MemoryCounterRepository>,
    pub aliases: Arc<MemoryAliasRepository>,
    pub visits: mpsc::Receiver<VisitEvent>,
}

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        allocator: AllocatorSettings {
            alphabet: Alphabet::default(),
            counter_start: 146,
            max_attempts: 100,
        },
        creation: CreationSettings {
            base_url: BASE_URL.to_string(),
            ..Default::default()
        },
        languages: vec!["en".to_string(), "fr".to_string()],
        ..Default::default()
    }
}

pub fn create_test_state(settings: ServiceSettings) -> TestAppParts {
    let mappings = Arc::new(MemoryMappingRepository::new());
    let counter = Arc::new(MemoryCounterRepository::new());
    let aliases = Arc::new(MemoryAliasRepository::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(
        Repositories {
            mappings: mappings.clone(),
            counter: counter.clone(),
            aliases: aliases.clone(),
        },
        settings,
        tx,
    );

    TestAppParts {
        state,
        mappings,
        counter,
        aliases,
        visits: rx,
    }
}

pub struct TestAppParts {
    pub state: AppState,
    pub mappings: Arc<MemoryMappingRepository>,
    pub counter: Arc<MemoryCounterRepository>,
    pub aliases: Arc<MemoryAliasRepository>,
    pub visits: mpsc::Receiver<VisitEvent>,
}

pub fn spawn_app_with(settings: ServiceSettings) -> TestApp {
    let parts = create_test_state(settings);
    let server = TestServer::new(app_router(parts.state.clone())).unwrap();

    TestApp {
        server,
        state: parts.state,
        mappings: parts.mappings,
        counter: parts.counter,
        aliases: parts.aliases,
        visits: parts.visits,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_settings())
}

pub fn mapping(code: &str, destination: &str, expire_at: Option<DateTime<Utc>>) -> Mapping {
    Mapping {
        code: code.to_string(),
        destination: destination.to_string(),
        content_hash: None,
        created_at: Utc::now(),
        expire_at,
        status: MappingStatus::Active,
        visits: 0,
        owner_id: None,
    }
}

pub fn blocked_mapping(code: &str, destination: &str) -> Mapping {
    Mapping {
        status: MappingStatus::Blocked,
        ..mapping(code, destination, None)
    }
}
