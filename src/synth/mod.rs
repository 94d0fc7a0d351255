//! Artifact synthesis: DTO, mapper, service and controller descriptions per resource type.

pub mod artifact;
pub mod controller;
pub mod dto;
pub mod mapper;
pub mod service;

pub use artifact::*;

use crate::config::build_spec;
use crate::config::resolved::sub_package;
use crate::error::ConfigError;
use crate::model::{FieldCatalog, RecordType, TypeCatalog};
use serde::Serialize;

/// Outcome of one synthesis pass.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisReport {
    pub artifacts: Vec<GeneratedArtifact>,
    /// Qualified names of types with nothing to generate.
    pub skipped: Vec<String>,
    #[serde(serialize_with = "errors_as_text")]
    pub errors: Vec<(String, ConfigError)>,
}

impl SynthesisReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Artifacts generated for one qualified type name.
    pub fn artifacts_for<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a GeneratedArtifact> + 'a {
        let (package, simple) = type_name.rsplit_once('.').unwrap_or(("", type_name));
        let controller_package = sub_package(package, "controller");
        let controller_name = format!("{}Resource", simple);
        self.artifacts.iter().filter(move |a| match a {
            GeneratedArtifact::Dto(d) => d.source == type_name,
            GeneratedArtifact::Mapper(m) => m.entity == type_name,
            GeneratedArtifact::Service(s) => s.entity == type_name,
            GeneratedArtifact::Controller(c) => c.package == controller_package && c.name == controller_name,
        })
    }
}

fn errors_as_text<S: serde::Serializer>(errors: &[(String, ConfigError)], s: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = s.serialize_seq(Some(errors.len()))?;
    for (type_name, err) in errors {
        seq.serialize_element(&serde_json::json!({ "type": type_name, "error": err.to_string() }))?;
    }
    seq.end()
}

pub struct Synthesizer<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> Synthesizer<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Synthesize every type carrying a resource declaration. One type's failure never stops the batch.
    pub fn run(&self) -> SynthesisReport {
        let mut report = SynthesisReport::default();
        for ty in self.catalog.types() {
            if ty.resource.is_none() {
                continue;
            }
            let name = ty.qualified_name();
            match self.synthesize(ty) {
                Ok(Some(artifacts)) => report.artifacts.extend(artifacts),
                Ok(None) => {
                    tracing::info!(type_name = %name, "no DTO configured, skipping synthesis");
                    report.skipped.push(name);
                }
                Err(e) => {
                    tracing::error!(type_name = %name, error = %e, "synthesis failed");
                    report.errors.push((name, e));
                }
            }
        }
        tracing::info!(
            artifacts = report.artifacts.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "synthesis finished"
        );
        report
    }

    /// The four artifacts of one type, or `None` when its spec opts out of generation.
    pub fn synthesize(&self, ty: &RecordType) -> Result<Option<Vec<GeneratedArtifact>>, ConfigError> {
        let cfg = ty.resource.as_ref().ok_or_else(|| {
            ConfigError::IllegalState(format!("no resource declaration on {}", ty.qualified_name()))
        })?;
        let spec = build_spec(ty, cfg, self.catalog)?;
        if !spec.should_generate {
            return Ok(None);
        }
        let descriptors = FieldCatalog::new(self.catalog).descriptors(ty, &spec.ignored_fields);
        Ok(Some(vec![
            GeneratedArtifact::Dto(dto::synthesize(ty, &spec, &descriptors)),
            GeneratedArtifact::Mapper(mapper::synthesize(ty, &spec)),
            GeneratedArtifact::Service(service::synthesize(ty, &spec)),
            GeneratedArtifact::Controller(controller::synthesize(ty, &spec)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::model::TypeTag;
    use std::collections::BTreeMap;

    fn cfg(dto: &str) -> ResourceConfig {
        ResourceConfig {
            dto: dto.into(),
            ..ResourceConfig::default()
        }
    }

    #[test]
    fn batch_continues_past_failures_and_skips() {
        let mut orphan = RecordType::resource("Orphan", "shop", cfg("OrphanDto"));
        orphan.extends = None;
        let types = vec![
            RecordType::resource("Order", "shop", cfg("OrderDto")).with_field("total", TypeTag::Double),
            orphan,
            RecordType::resource("Note", "shop", cfg("")),
            RecordType::new("Plain", "shop"),
        ];
        let catalog = TypeCatalog::new(types, BTreeMap::new()).unwrap();
        let report = Synthesizer::new(&catalog).run();

        assert_eq!(report.artifacts.len(), 4);
        assert_eq!(report.skipped, vec!["shop.Note".to_string()]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, "shop.Orphan");
        assert!(matches!(report.errors[0].1, ConfigError::Inheritance { .. }));
        assert!(!report.is_clean());

        let names: Vec<_> = report.artifacts.iter().map(|a| a.qualified_name()).collect();
        assert_eq!(
            names,
            vec![
                "shop.dto.OrderDTO",
                "shop.mapper.OrderMapper",
                "shop.service.OrderService",
                "shop.controller.OrderResource"
            ]
        );
        assert_eq!(report.artifacts_for("shop.Order").count(), 4);
    }

    #[test]
    fn report_serializes_errors_as_text() {
        let mut orphan = RecordType::resource("Orphan", "", cfg("X"));
        orphan.extends = Some("Other".into());
        let catalog = TypeCatalog::new(vec![orphan], BTreeMap::new()).unwrap();
        let json = serde_json::to_value(Synthesizer::new(&catalog).run()).unwrap();
        assert_eq!(json["errors"][0]["type"], "Orphan");
        assert!(json["errors"][0]["error"].as_str().unwrap().contains("BaseRecord"));
    }
}
