//! Controller synthesis: the five REST endpoints, paging defaults and disabled verbs.

use crate::config::resolved::sub_package;
use crate::config::{HttpVerb, ResourceSpec};
use crate::error::AppError;
use crate::model::RecordType;
use crate::synth::artifact::{ControllerSpec, Endpoint, EndpointBehavior, QueryParam};
use crate::synth::service::service_name;

pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

pub fn synthesize(ty: &RecordType, spec: &ResourceSpec) -> ControllerSpec {
    let paging = vec![
        QueryParam {
            name: "offset".into(),
            default: "0".into(),
        },
        QueryParam {
            name: "limit".into(),
            default: spec.pagination.default_limit.to_string(),
        },
    ];
    let endpoints = vec![
        endpoint(spec, "getAll", HttpVerb::Get, "", None, paging, "findAll", 200),
        endpoint(spec, "getById", HttpVerb::Get, "/{id}", None, vec![], "findById", 200),
        endpoint(spec, "create", HttpVerb::Post, "", None, vec![], "create", 201),
        endpoint(spec, "update", HttpVerb::Put, "/{id}", None, vec![], "update", 200),
        endpoint(spec, "patch", HttpVerb::Patch, "/{id}", Some(MERGE_PATCH_JSON), vec![], "patch", 200),
        endpoint(spec, "delete", HttpVerb::Delete, "/{id}", None, vec![], "delete", 204),
    ];
    ControllerSpec {
        name: format!("{}Resource", ty.name),
        package: sub_package(&spec.package, "controller"),
        path: spec.base_path.clone(),
        scope: spec.scope,
        service: sub_package(&sub_package(&spec.package, "service"), &service_name(ty)),
        endpoints,
    }
}

#[allow(clippy::too_many_arguments)]
fn endpoint(
    spec: &ResourceSpec,
    name: &str,
    verb: HttpVerb,
    path: &str,
    consumes: Option<&str>,
    query: Vec<QueryParam>,
    service_call: &str,
    status: u16,
) -> Endpoint {
    let behavior = if spec.is_disabled(verb) {
        let err = AppError::VerbDisabled(verb);
        EndpointBehavior::Disabled {
            status: err.status().as_u16(),
            detail: err.to_string(),
        }
    } else {
        EndpointBehavior::Dispatch {
            service_call: service_call.to_string(),
            status,
            max_limit: (name == "getAll").then_some(spec.pagination.max_limit),
        }
    };
    Endpoint {
        name: name.to_string(),
        verb,
        path: path.to_string(),
        consumes: consumes.map(str::to_string),
        query,
        behavior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_spec, PageableConfig, ResourceConfig, Scope};
    use crate::model::TypeCatalog;
    use std::collections::BTreeMap;

    fn controller(cfg: ResourceConfig) -> ControllerSpec {
        let ty = RecordType::resource("Invoice", "billing", cfg.clone());
        let catalog = TypeCatalog::new(vec![ty], BTreeMap::new()).unwrap();
        let ty = catalog.get("Invoice").unwrap();
        synthesize(ty, &build_spec(ty, &cfg, &catalog).unwrap())
    }

    #[test]
    fn standard_endpoints_under_default_path() {
        let ctrl = controller(ResourceConfig {
            pageable: PageableConfig { limit: 20, max_limit: 100 },
            scope: Scope::Request,
            ..ResourceConfig::default()
        });
        assert_eq!(ctrl.name, "InvoiceResource");
        assert_eq!(ctrl.path, "/api/invoice");
        assert_eq!(ctrl.scope, Scope::Request);
        let get_all = ctrl.endpoint("getAll").unwrap();
        assert_eq!(get_all.query[1], QueryParam { name: "limit".into(), default: "20".into() });
        assert_eq!(
            get_all.behavior,
            EndpointBehavior::Dispatch {
                service_call: "findAll".into(),
                status: 200,
                max_limit: Some(100)
            }
        );
        assert_eq!(ctrl.endpoint("patch").unwrap().consumes.as_deref(), Some(MERGE_PATCH_JSON));
        assert!(matches!(
            ctrl.endpoint("delete").unwrap().behavior,
            EndpointBehavior::Dispatch { status: 204, .. }
        ));
    }

    #[test]
    fn disabled_verbs_become_not_found_stubs() {
        let ctrl = controller(ResourceConfig {
            disabled_for: vec![HttpVerb::Delete, HttpVerb::Get],
            ..ResourceConfig::default()
        });
        let disabled = |name: &str| match &ctrl.endpoint(name).unwrap().behavior {
            EndpointBehavior::Disabled { status, detail } => Some((*status, detail.clone())),
            EndpointBehavior::Dispatch { .. } => None,
        };
        assert_eq!(
            disabled("delete"),
            Some((404, "DELETE method is disabled for this resource".to_string()))
        );
        assert_eq!(disabled("getAll"), Some((404, "GET method is disabled for this resource".to_string())));
        assert!(disabled("getById").is_some());
        assert!(disabled("create").is_none());
        assert!(disabled("patch").is_none());
    }
}
