//! Entity registry: immutable snapshot of the resource types served at runtime.

use crate::config::{ResourceSpec, SpecCache};
use crate::error::{AppError, ConfigError};
use crate::model::{RecordType, TypeCatalog};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RegistryEntry {
    /// Case preserved.
    pub resource_name: String,
    pub record_type: Arc<RecordType>,
    pub spec: Arc<ResourceSpec>,
}

/// Built once at startup; shared read-only through `Arc`.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: Vec<RegistryEntry>,
    by_lower: HashMap<String, usize>,
}

impl EntityRegistry {
    /// Collect persistable, resource-declared types under `scan_roots` (every package when empty).
    pub fn init(catalog: &TypeCatalog, cache: &SpecCache, scan_roots: &[String]) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        let mut by_lower = HashMap::new();
        for ty in catalog.types() {
            if !ty.persistable || ty.resource.is_none() || !in_scan_roots(&ty.package, scan_roots) {
                continue;
            }
            let spec = match cache.config_for(ty, catalog) {
                Ok(spec) => spec,
                Err(e) => {
                    tracing::warn!(type_name = %ty.qualified_name(), error = %e, "resource excluded from registry");
                    continue;
                }
            };
            let key = spec.resource_name.to_lowercase();
            if by_lower.contains_key(&key) {
                return Err(ConfigError::DuplicateResource(spec.resource_name.clone()));
            }
            by_lower.insert(key, entries.len());
            entries.push(RegistryEntry {
                resource_name: spec.resource_name.clone(),
                record_type: ty.clone(),
                spec,
            });
        }
        tracing::info!(resources = entries.len(), "entity registry initialized");
        Ok(Self { entries, by_lower })
    }

    /// Case-insensitive lookup by simple name.
    pub fn by_simple_name(&self, name: &str) -> Result<&RegistryEntry, AppError> {
        self.find(name)
            .ok_or_else(|| AppError::NotFound(format!("Entity not found: {}", name)))
    }

    pub fn find(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_lower.get(&name.to_lowercase()).map(|&i| &self.entries[i])
    }

    pub fn all(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn in_scan_roots(package: &str, roots: &[String]) -> bool {
    roots.is_empty()
        || roots.iter().any(|root| {
            package == root
                || package
                    .strip_prefix(root.as_str())
                    .map_or(false, |rest| rest.starts_with('.'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::model::TypeTag;
    use std::collections::BTreeMap;

    fn catalog() -> TypeCatalog {
        let customer = RecordType::resource("Customer", "shop.crm", ResourceConfig::default())
            .with_field("name", TypeTag::String);
        let invoice = RecordType::resource("Invoice", "billing", ResourceConfig::default());
        let mut draft = RecordType::resource("Draft", "shop", ResourceConfig::default());
        draft.persistable = false;
        let mut orphan = RecordType::resource("Orphan", "shop", ResourceConfig::default());
        orphan.extends = None;
        let lookalike = RecordType::resource("Lookalike", "shopping", ResourceConfig::default());
        TypeCatalog::new(vec![customer, invoice, draft, orphan, lookalike], BTreeMap::new()).unwrap()
    }

    #[test]
    fn selects_by_markers_and_scan_roots() {
        let catalog = catalog();
        let registry = EntityRegistry::init(&catalog, &SpecCache::new(), &["shop".to_string()]).unwrap();
        let names: Vec<_> = registry.all().iter().map(|e| e.resource_name.as_str()).collect();
        assert_eq!(names, vec!["Customer"]);

        let everything = EntityRegistry::init(&catalog, &SpecCache::new(), &[]).unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = catalog();
        let registry = EntityRegistry::init(&catalog, &SpecCache::new(), &[]).unwrap();
        assert_eq!(registry.by_simple_name("INVOICE").unwrap().resource_name, "Invoice");
        assert_eq!(registry.by_simple_name("invoice").unwrap().spec.base_path, "/api/invoice");
        let err = registry.by_simple_name("ghost").unwrap_err();
        assert_eq!(err.to_string(), "Entity not found: ghost");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let a = RecordType::resource("Item", "a", ResourceConfig::default());
        let b = RecordType::resource("ITEM", "b", ResourceConfig::default());
        let catalog = TypeCatalog::new(vec![a, b], BTreeMap::new()).unwrap();
        let err = EntityRegistry::init(&catalog, &SpecCache::new(), &[]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateResource("ITEM".into()));
    }
}
