//! Resolved resource spec: one resource declaration validated and normalized for runtime and synthesis.

use crate::config::types::{HttpVerb, ResourceConfig, Scope};
use crate::error::ConfigError;
use crate::model::{RecordType, TypeCatalog, TypeTag, BASE_RECORD};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const DTO_SUFFIX: &str = "DTO";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Pagination {
    /// Limit actually dispatched for a requested one.
    pub fn bound(&self, requested: u32) -> u32 {
        requested.min(self.max_limit)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    pub require_auth: bool,
    pub roles_allowed: BTreeSet<String>,
}

impl SecurityRule {
    pub fn is_anonymous(&self) -> bool {
        !self.require_auth && self.roles_allowed.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFlags {
    pub on_create: bool,
    pub on_update: bool,
    pub on_delete: bool,
    pub on_patch: bool,
    pub emitter: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRule {
    pub enabled: bool,
    pub ttl_seconds: u32,
}

/// Normalized configuration of one resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    pub resource_name: String,
    pub type_name: String,
    pub package: String,
    pub base_path: String,
    pub dto_name: String,
    pub ignored_fields: BTreeSet<String>,
    pub ignored_nested_fields: BTreeSet<String>,
    pub pagination: Pagination,
    pub security: SecurityRule,
    pub events: EventFlags,
    pub cache: CacheRule,
    pub disabled_verbs: BTreeSet<HttpVerb>,
    pub repository_package: String,
    pub scope: Scope,
    pub should_generate: bool,
}

impl ResourceSpec {
    pub fn is_disabled(&self, verb: HttpVerb) -> bool {
        self.disabled_verbs.contains(&verb)
    }

    pub fn dto_package(&self) -> String {
        sub_package(&self.package, "dto")
    }
}

pub(crate) fn sub_package(package: &str, child: &str) -> String {
    if package.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", package, child)
    }
}

/// Normalize the resource declaration of `ty` into a [`ResourceSpec`].
pub fn build_spec(ty: &RecordType, cfg: &ResourceConfig, catalog: &TypeCatalog) -> Result<ResourceSpec, ConfigError> {
    if !ty.extends_base_record() {
        return Err(ConfigError::Inheritance {
            type_name: ty.qualified_name(),
            base: BASE_RECORD.into(),
        });
    }

    for path in cfg.mapping.ignore.iter().chain(cfg.mapping.ignore_nested.iter()) {
        validate_mapping_path(ty, path, catalog)?;
    }

    let resource_name = ty.name.clone();
    if resource_name.trim().is_empty() {
        return Err(ConfigError::Validation("resource name must not be blank".into()));
    }

    let base_path = if cfg.path.trim().is_empty() {
        format!("/api/{}", resource_name.to_lowercase())
    } else {
        normalize_path(&cfg.path)
    };

    Ok(ResourceSpec {
        resource_name,
        type_name: ty.name.clone(),
        package: ty.package.clone(),
        base_path,
        dto_name: dto_name(&ty.name, &cfg.dto),
        ignored_fields: cfg.mapping.ignore.iter().cloned().collect(),
        ignored_nested_fields: cfg.mapping.ignore_nested.iter().cloned().collect(),
        pagination: Pagination {
            default_limit: cfg.pageable.limit,
            max_limit: cfg.pageable.max_limit,
        },
        security: SecurityRule {
            require_auth: cfg.security.require_auth,
            roles_allowed: cfg.security.roles_allowed.iter().cloned().collect(),
        },
        events: EventFlags {
            on_create: cfg.events.on_create,
            on_update: cfg.events.on_update,
            on_delete: cfg.events.on_delete,
            on_patch: cfg.events.on_patch,
            emitter: cfg
                .events
                .emitter
                .as_ref()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        },
        cache: CacheRule {
            enabled: cfg.cache.enabled,
            ttl_seconds: cfg.cache.ttl_seconds,
        },
        disabled_verbs: cfg.disabled_for.iter().copied().collect(),
        repository_package: if cfg.repository_package.trim().is_empty() {
            "repository".into()
        } else {
            cfg.repository_package.trim().to_string()
        },
        scope: cfg.scope,
        should_generate: !(cfg.dto.trim().is_empty() && cfg.mapping.ignore.is_empty()),
    })
}

/// Trailing `dto` / `_dto`, any case.
const DTO_SUFFIX_PATTERN: &str = r"(?i)_?dto$";

/// `Order` + `""` -> `OrderDTO`, `order_dto` -> `orderDTO`, `OrderDto` -> `OrderDTO`.
pub fn dto_name(type_name: &str, configured: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let configured = configured.trim();
    if configured.is_empty() {
        return format!("{}{}", type_name, DTO_SUFFIX);
    }
    let suffix = SUFFIX.get_or_init(|| Regex::new(DTO_SUFFIX_PATTERN).expect("Failed to compile DTO suffix regex"));
    let stem = suffix.replace(configured, "").into_owned();
    let stem = if stem.is_empty() { type_name } else { stem.as_str() };
    format!("{}{}", stem, DTO_SUFFIX)
}

/// Single leading slash, no trailing slash, no empty segments.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.trim().is_empty()).collect();
    format!("/{}", segments.join("/"))
}

fn validate_mapping_path(ty: &RecordType, path: &str, catalog: &TypeCatalog) -> Result<(), ConfigError> {
    let invalid = |segment: &str, reason: &str| ConfigError::InvalidMappingPath {
        type_name: ty.qualified_name(),
        path: path.to_string(),
        segment: segment.to_string(),
        reason: reason.to_string(),
    };
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = ty;
    for (i, segment) in segments.iter().enumerate() {
        if segment.trim().is_empty() {
            return Err(invalid(segment, "is empty"));
        }
        let field = catalog
            .field_of(current, segment)
            .ok_or_else(|| invalid(segment, &format!("is not a field of {}", current.name)))?;
        if i + 1 == segments.len() {
            break;
        }
        let target = match catalog.resolve_alias(&field.ty) {
            TypeTag::List(t) | TypeTag::Set(t) | TypeTag::Collection(t) => *t,
            TypeTag::Map(_, v) => *v,
            other => other,
        };
        current = catalog
            .record_of(&target)
            .ok_or_else(|| invalid(segment, "does not refer to a record type"))?;
    }
    Ok(())
}
