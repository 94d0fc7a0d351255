//! Shared application state for all routes. Built once at startup, read-only afterwards.

use crate::config::SpecCache;
use crate::error::ConfigError;
use crate::model::TypeCatalog;
use crate::registry::EntityRegistry;
use crate::security::{Principal, SecurityEnforcer};
use crate::service::{EmitterRegistry, GenericDispatcher, PatchEngine};
use crate::store::RepositoryPort;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<TypeCatalog>,
    pub specs: Arc<SpecCache>,
    pub registry: Arc<EntityRegistry>,
    pub dispatcher: Arc<GenericDispatcher>,
    pub patch: PatchEngine,
    pub security: SecurityEnforcer,
    /// Bearer token -> principal.
    pub tokens: Arc<HashMap<String, Principal>>,
}

impl AppState {
    /// Registry init, emitter verification and wiring of the runtime services.
    pub fn build(
        catalog: Arc<TypeCatalog>,
        repository: Arc<dyn RepositoryPort>,
        emitters: EmitterRegistry,
        scan_roots: &[String],
        tokens: HashMap<String, Principal>,
    ) -> Result<Self, ConfigError> {
        let specs = Arc::new(SpecCache::new());
        let registry = Arc::new(EntityRegistry::init(&catalog, &specs, scan_roots)?);
        emitters.verify(&registry)?;
        let dispatcher = Arc::new(GenericDispatcher::new(repository, catalog.clone(), emitters));
        Ok(Self::from_parts(catalog, specs, registry, dispatcher, tokens))
    }

    /// Wire state around an already built dispatcher (custom clock, custom repository).
    pub fn from_parts(
        catalog: Arc<TypeCatalog>,
        specs: Arc<SpecCache>,
        registry: Arc<EntityRegistry>,
        dispatcher: Arc<GenericDispatcher>,
        tokens: HashMap<String, Principal>,
    ) -> Self {
        Self {
            catalog,
            specs,
            security: SecurityEnforcer::new(registry.clone()),
            patch: PatchEngine::new(dispatcher.clone()),
            registry,
            dispatcher,
            tokens: Arc::new(tokens),
        }
    }
}
