//! Raw config types matching the schema document (record types + resource declarations).

use crate::model::{RecordType, TypeTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema document version understood by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// HTTP verbs a resource can disable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime of the synthesized controller component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scope {
    #[default]
    Application,
    Request,
    Session,
    Dependent,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub ignore_nested: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageableConfig {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for PageableConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> u32 {
    20
}

fn default_max_limit() -> u32 {
    100
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsConfig {
    #[serde(default)]
    pub on_create: bool,
    #[serde(default)]
    pub on_update: bool,
    #[serde(default)]
    pub on_delete: bool,
    #[serde(default)]
    pub on_patch: bool,
    /// Name of a custom emitter; absent means the default event channel.
    #[serde(default)]
    pub emitter: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u32 {
    60
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    #[serde(default)]
    pub roles_allowed: Vec<String>,
    #[serde(default)]
    pub require_auth: bool,
}

/// Resource declaration attached to a record type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub dto: String,
    #[serde(default = "default_repository_package")]
    pub repository_package: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub disabled_for: Vec<HttpVerb>,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub pageable: PageableConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            dto: String::new(),
            repository_package: default_repository_package(),
            scope: Scope::default(),
            disabled_for: Vec::new(),
            mapping: MappingConfig::default(),
            pageable: PageableConfig::default(),
            events: EventsConfig::default(),
            cache: CacheConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

fn default_repository_package() -> String {
    "repository".into()
}

/// Whole schema document as loaded from disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub version: u32,
    /// User collection types and their declared supertype, e.g. `"OrderLines": "List<OrderLine>"`.
    #[serde(default)]
    pub aliases: BTreeMap<String, TypeTag>,
    #[serde(default)]
    pub types: Vec<RecordType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_config_defaults() {
        let cfg: ResourceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ResourceConfig::default());
        assert_eq!(cfg.pageable.limit, 20);
        assert_eq!(cfg.pageable.max_limit, 100);
        assert_eq!(cfg.cache.ttl_seconds, 60);
        assert_eq!(cfg.repository_package, "repository");
        assert!(!cfg.security.require_auth);
    }

    #[test]
    fn resource_config_reads_camel_case_surface() {
        let cfg: ResourceConfig = serde_json::from_value(serde_json::json!({
            "path": "/billing/invoices",
            "disabledFor": ["DELETE"],
            "mapping": { "ignore": ["secret"], "ignoreNested": ["customer.orders"] },
            "pageable": { "limit": 5, "maxLimit": 50 },
            "events": { "onPatch": true, "emitter": "audit" },
            "security": { "rolesAllowed": ["admin"], "requireAuth": true },
            "scope": "REQUEST"
        }))
        .unwrap();
        assert_eq!(cfg.disabled_for, vec![HttpVerb::Delete]);
        assert_eq!(cfg.mapping.ignore_nested, vec!["customer.orders".to_string()]);
        assert_eq!(cfg.pageable.max_limit, 50);
        assert!(cfg.events.on_patch);
        assert_eq!(cfg.events.emitter.as_deref(), Some("audit"));
        assert_eq!(cfg.scope, Scope::Request);
    }
}
