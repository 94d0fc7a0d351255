//! Per-type spec cache: each type's spec is computed at most once, failures included.

use crate::config::resolved::{build_spec, ResourceSpec};
use crate::error::ConfigError;
use crate::model::{RecordType, TypeCatalog};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

type Slot = Arc<OnceLock<Result<Arc<ResourceSpec>, ConfigError>>>;

/// Owned by the server state; shared through `Arc`.
#[derive(Default)]
pub struct SpecCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl SpecCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec of `ty`, computing it on first access. A type without a resource
    /// declaration yields a terminal `IllegalState`.
    pub fn config_for(&self, ty: &RecordType, catalog: &TypeCatalog) -> Result<Arc<ResourceSpec>, ConfigError> {
        let slot = self.slot(&ty.qualified_name())?;
        slot.get_or_init(|| {
            tracing::debug!(type_name = %ty.qualified_name(), "resolving resource spec");
            match &ty.resource {
                Some(cfg) => build_spec(ty, cfg, catalog).map(Arc::new),
                None => Err(ConfigError::IllegalState(format!(
                    "no resource declaration on {}",
                    ty.qualified_name()
                ))),
            }
        })
        .clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map lock is held only to fetch the slot; computation runs outside it.
    fn slot(&self, key: &str) -> Result<Slot, ConfigError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ConfigError::IllegalState("spec cache lock poisoned".into()))?;
        Ok(slots.entry(key.to_string()).or_default().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::model::TypeTag;
    use std::collections::BTreeMap;
    use std::thread;

    fn catalog() -> TypeCatalog {
        let a = RecordType::resource("Account", "bank", ResourceConfig::default()).with_field("iban", TypeTag::String);
        let plain = RecordType::new("Plain", "bank");
        TypeCatalog::new(vec![a, plain], BTreeMap::new()).unwrap()
    }

    #[test]
    fn computes_once_per_type() {
        let catalog = Arc::new(catalog());
        let cache = Arc::new(SpecCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (catalog, cache) = (catalog.clone(), cache.clone());
                thread::spawn(move || cache.config_for(catalog.get("Account").unwrap(), &catalog).unwrap())
            })
            .collect();
        let specs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(specs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_declaration_is_terminal() {
        let catalog = catalog();
        let cache = SpecCache::new();
        let plain = catalog.get("Plain").unwrap();
        let first = cache.config_for(plain, &catalog).unwrap_err();
        assert!(matches!(first, ConfigError::IllegalState(_)));
        assert_eq!(cache.config_for(plain, &catalog).unwrap_err(), first);
    }
}
