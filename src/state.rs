//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    AllocatorSettings, CodeAllocator, CreationSettings, ExpirationSweeper, MappingService,
    RedirectResolver, ResolverSettings, RouteConflictChecker,
};
use crate::domain::path_conflict::PathConflictChecker;
use crate::domain::repositories::{AliasRepository, CounterRepository, MappingRepository};
use crate::domain::visit_event::VisitEvent;

pub type AppMappingService =
    MappingService<dyn MappingRepository, dyn CounterRepository, dyn PathConflictChecker>;
pub type AppResolver = RedirectResolver<dyn MappingRepository>;
pub type AppSweeper = ExpirationSweeper<dyn MappingRepository>;

/// Storage backends the services run on.
#[derive(Clone)]
pub struct Repositories {
    pub mappings: Arc<dyn MappingRepository>,
    pub counter: Arc<dyn CounterRepository>,
    pub aliases: Arc<dyn AliasRepository>,
}

/// Service-level settings derived from [`crate::config::Config`].
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub allocator: AllocatorSettings,
    pub creation: CreationSettings,
    pub resolver: ResolverSettings,
    pub languages: Vec<String>,
    pub reserved_paths: Vec<String>,
}

/// The services every entry point (HTTP server, admin CLI) runs on.
pub struct Services {
    pub mappings: Arc<dyn MappingRepository>,
    pub mapping_service: Arc<AppMappingService>,
    pub resolver: Arc<AppResolver>,
    pub sweeper: Arc<AppSweeper>,
}

impl Services {
    /// Wires the services on top of `repositories`.
    pub fn new(repositories: Repositories, settings: ServiceSettings) -> Self {
        let Repositories {
            mappings,
            counter,
            aliases,
        } = repositories;

        let conflicts: Arc<dyn PathConflictChecker> = Arc::new(RouteConflictChecker::new(
            settings.languages,
            settings.reserved_paths,
            aliases,
        ));

        let allocator = Arc::new(CodeAllocator::new(
            mappings.clone(),
            counter,
            conflicts,
            settings.allocator,
        ));

        Self {
            mapping_service: Arc::new(MappingService::new(
                mappings.clone(),
                allocator,
                settings.creation,
            )),
            resolver: Arc::new(RedirectResolver::with_settings(
                mappings.clone(),
                settings.resolver,
            )),
            sweeper: Arc::new(ExpirationSweeper::new(mappings.clone())),
            mappings,
        }
    }
}

/// Application state shared by all requests.
///
/// Cheap to clone; every field is behind an `Arc` or is a channel handle.
#[derive(Clone)]
pub struct AppState {
    pub mapping_repository: Arc<dyn MappingRepository>,
    pub mapping_service: Arc<AppMappingService>,
    pub resolver: Arc<AppResolver>,
    pub sweeper: Arc<AppSweeper>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        settings: ServiceSettings,
        visit_sender: mpsc::Sender<VisitEvent>,
    ) -> Self {
        let services = Services::new(repositories, settings);

        Self {
            mapping_repository: services.mappings,
            mapping_service: services.mapping_service,
            resolver: services.resolver,
            sweeper: services.sweeper,
            visit_sender,
        }
    }
}
