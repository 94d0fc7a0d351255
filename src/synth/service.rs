//! CRUD service synthesis: base methods plus event-emitting overrides.

use crate::config::resolved::sub_package;
use crate::config::ResourceSpec;
use crate::model::RecordType;
use crate::service::events::EventKind;
use crate::synth::artifact::{Emission, ServiceOverride, ServiceSpec};
use crate::synth::mapper::mapper_name;

pub const BASE_METHODS: [&str; 6] = ["findAll", "findById", "create", "update", "delete", "patch"];

pub fn service_name(ty: &RecordType) -> String {
    format!("{}Service", ty.name)
}

pub fn synthesize(ty: &RecordType, spec: &ResourceSpec) -> ServiceSpec {
    let events = &spec.events;
    let emission = match &events.emitter {
        Some(emitter) => Emission::Custom {
            emitter: emitter.clone(),
        },
        None => Emission::Fire,
    };
    let overrides = [
        (events.on_create, "create", EventKind::Create),
        (events.on_update, "update", EventKind::Update),
        (events.on_delete, "delete", EventKind::Delete),
        (events.on_patch, "patch", EventKind::Patch),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| *enabled)
    .map(|(_, method, event)| ServiceOverride {
        method: method.to_string(),
        event,
        emission: emission.clone(),
    })
    .collect();

    ServiceSpec {
        name: service_name(ty),
        package: sub_package(&spec.package, "service"),
        entity: ty.qualified_name(),
        dto: sub_package(&spec.dto_package(), &spec.dto_name),
        mapper: sub_package(&sub_package(&spec.package, "mapper"), &mapper_name(ty)),
        repository: format!(
            "{}.{}Repository",
            sub_package(&spec.package, &spec.repository_package),
            ty.name
        ),
        base_methods: BASE_METHODS.iter().map(|m| m.to_string()).collect(),
        overrides,
        emitter: events.emitter.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_spec, EventsConfig, ResourceConfig};
    use crate::model::TypeCatalog;
    use std::collections::BTreeMap;

    fn service(events: EventsConfig, repository_package: &str) -> ServiceSpec {
        let cfg = ResourceConfig {
            events,
            repository_package: repository_package.into(),
            ..ResourceConfig::default()
        };
        let ty = RecordType::resource("Invoice", "billing", cfg.clone());
        let catalog = TypeCatalog::new(vec![ty], BTreeMap::new()).unwrap();
        let ty = catalog.get("Invoice").unwrap();
        synthesize(ty, &build_spec(ty, &cfg, &catalog).unwrap())
    }

    #[test]
    fn names_and_repository_binding() {
        let svc = service(EventsConfig::default(), "persistence");
        assert_eq!(svc.name, "InvoiceService");
        assert_eq!(svc.package, "billing.service");
        assert_eq!(svc.repository, "billing.persistence.InvoiceRepository");
        assert_eq!(svc.mapper, "billing.mapper.InvoiceMapper");
        assert_eq!(svc.base_methods.len(), 6);
        assert!(svc.overrides.is_empty());
    }

    #[test]
    fn overrides_follow_flags_and_fire_by_default() {
        let svc = service(
            EventsConfig {
                on_create: true,
                on_delete: true,
                ..EventsConfig::default()
            },
            "repository",
        );
        let methods: Vec<_> = svc.overrides.iter().map(|o| o.method.as_str()).collect();
        assert_eq!(methods, vec!["create", "delete"]);
        assert!(svc.overrides.iter().all(|o| o.emission == Emission::Fire));
        assert_eq!(svc.override_for("delete").unwrap().event, EventKind::Delete);
    }

    #[test]
    fn patch_override_is_driven_by_on_patch() {
        let only_delete = service(
            EventsConfig {
                on_delete: true,
                ..EventsConfig::default()
            },
            "repository",
        );
        assert!(only_delete.override_for("patch").is_none());

        let only_patch = service(
            EventsConfig {
                on_patch: true,
                emitter: Some("audit".into()),
                ..EventsConfig::default()
            },
            "repository",
        );
        let patch = only_patch.override_for("patch").unwrap();
        assert_eq!(patch.event, EventKind::Patch);
        assert_eq!(patch.emission.call(), "emitter.emit");
        assert_eq!(patch.emission, Emission::Custom { emitter: "audit".into() });
        assert!(only_patch.override_for("delete").is_none());
    }
}
