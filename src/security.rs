//! Per-request authorization gate over resource paths.

use crate::error::AppError;
use crate::registry::EntityRegistry;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Authenticated caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Clone)]
pub struct SecurityEnforcer {
    registry: Arc<EntityRegistry>,
}

impl SecurityEnforcer {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self { registry }
    }

    /// `resource` is the decoded `{resource}` path segment, the same name dispatch resolves.
    pub fn evaluate(&self, method: &Method, resource: &str, principal: Option<&Principal>) -> Result<(), AppError> {
        if *method == Method::OPTIONS || *method == Method::HEAD {
            return Ok(());
        }
        // Unknown resources fall through so dispatch reports the 404.
        let Some(entry) = self.registry.find(resource) else {
            return Ok(());
        };
        let rule = &entry.spec.security;
        if rule.is_anonymous() {
            return Ok(());
        }
        if rule.require_auth && principal.is_none() {
            tracing::warn!(resource = %entry.resource_name, %method, "unauthenticated request rejected");
            return Err(AppError::Unauthorized);
        }
        if !rule.roles_allowed.is_empty() {
            let permitted = principal
                .map(|p| p.roles.iter().any(|r| rule.roles_allowed.contains(r)))
                .unwrap_or(false);
            if !permitted {
                tracing::warn!(
                    resource = %entry.resource_name,
                    principal = principal.map(|p| p.name.as_str()).unwrap_or("anonymous"),
                    "request rejected, no allowed role"
                );
                return Err(AppError::Forbidden);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResourceConfig, SecurityConfig, SpecCache};
    use crate::model::{RecordType, TypeCatalog};
    use axum::http::StatusCode;
    use std::collections::BTreeMap;

    fn enforcer() -> SecurityEnforcer {
        let open = RecordType::resource("Note", "app", ResourceConfig::default());
        let guarded = RecordType::resource(
            "Ledger",
            "app",
            ResourceConfig {
                security: SecurityConfig {
                    roles_allowed: vec!["admin".into()],
                    require_auth: true,
                },
                ..ResourceConfig::default()
            },
        );
        let roles_only = RecordType::resource(
            "Report",
            "app",
            ResourceConfig {
                security: SecurityConfig {
                    roles_allowed: vec!["auditor".into()],
                    require_auth: false,
                },
                ..ResourceConfig::default()
            },
        );
        let catalog = TypeCatalog::new(vec![open, guarded, roles_only], BTreeMap::new()).unwrap();
        let registry = EntityRegistry::init(&catalog, &SpecCache::new(), &[]).unwrap();
        SecurityEnforcer::new(Arc::new(registry))
    }

    fn status(r: Result<(), AppError>) -> Option<StatusCode> {
        r.err().map(|e| e.status())
    }

    #[test]
    fn anonymous_resources_allow_everyone() {
        let e = enforcer();
        let user = Principal::new("u", ["user"]);
        assert!(e.evaluate(&Method::GET, "note", None).is_ok());
        assert!(e.evaluate(&Method::DELETE, "note", Some(&user)).is_ok());
    }

    #[test]
    fn require_auth_without_principal_is_401() {
        let e = enforcer();
        assert_eq!(status(e.evaluate(&Method::GET, "ledger", None)), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn role_mismatch_is_403_and_match_allows() {
        let e = enforcer();
        let user = Principal::new("u", ["user"]);
        let admin = Principal::new("a", ["admin", "user"]);
        assert_eq!(
            status(e.evaluate(&Method::GET, "Ledger", Some(&user))),
            Some(StatusCode::FORBIDDEN)
        );
        assert!(e.evaluate(&Method::GET, "ledger", Some(&admin)).is_ok());
        assert_eq!(status(e.evaluate(&Method::GET, "report", None)), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn passthrough_cases() {
        let e = enforcer();
        assert!(e.evaluate(&Method::OPTIONS, "ledger", None).is_ok());
        assert!(e.evaluate(&Method::HEAD, "ledger", None).is_ok());
        assert!(e.evaluate(&Method::GET, "unknown", None).is_ok());
    }
}
