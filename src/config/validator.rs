//! Schema validation: referential integrity and field consistency.

use crate::config::types::{SchemaDocument, SCHEMA_VERSION};
use crate::error::ConfigError;
use crate::model::{TypeTag, BASE_RECORD};
use std::collections::HashSet;

pub fn validate(doc: &SchemaDocument) -> Result<(), ConfigError> {
    if doc.version != SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: doc.version,
            expected: SCHEMA_VERSION,
        });
    }

    let type_names: HashSet<&str> = doc.types.iter().map(|t| t.name.as_str()).collect();

    for ty in &doc.types {
        if ty.name.trim().is_empty() {
            return Err(ConfigError::Validation("type name must not be blank".into()));
        }
        if let Some(base) = ty.extends.as_deref() {
            if base != BASE_RECORD && !type_names.contains(base) {
                return Err(ConfigError::MissingReference {
                    kind: "type",
                    id: base.to_string(),
                });
            }
        }
        let mut seen = HashSet::new();
        for field in &ty.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!("blank field name on {}", ty.name)));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate field '{}' on {}",
                    field.name, ty.name
                )));
            }
        }
    }

    for (alias, target) in &doc.aliases {
        if !target.is_collection() && !matches!(target, TypeTag::Named(_)) {
            return Err(ConfigError::Validation(format!(
                "alias '{}' must name a collection type, got {}",
                alias, target
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDecl, RecordType};
    use std::collections::BTreeMap;

    fn doc(types: Vec<RecordType>) -> SchemaDocument {
        SchemaDocument {
            version: SCHEMA_VERSION,
            aliases: BTreeMap::new(),
            types,
        }
    }

    #[test]
    fn rejects_unknown_base_type() {
        let mut ty = RecordType::new("Child", "p");
        ty.extends = Some("Ghost".into());
        let err = validate(&doc(vec![ty])).unwrap_err();
        assert_eq!(err, ConfigError::MissingReference { kind: "type", id: "Ghost".into() });
    }

    #[test]
    fn rejects_duplicate_fields_and_bad_version() {
        let mut ty = RecordType::new("T", "p").with_field("a", TypeTag::Long);
        ty.fields.push(FieldDecl::new("a", TypeTag::String));
        assert!(matches!(validate(&doc(vec![ty])), Err(ConfigError::Validation(_))));

        let mut d = doc(vec![]);
        d.version = 7;
        assert!(matches!(validate(&d), Err(ConfigError::UnsupportedVersion { found: 7, .. })));
    }

    #[test]
    fn aliases_must_be_collections() {
        let mut d = doc(vec![]);
        d.aliases.insert("Money".into(), TypeTag::Double);
        assert!(validate(&d).is_err());
        d.aliases.insert("Money".into(), TypeTag::list_of(TypeTag::Double));
        assert!(validate(&d).is_ok());
    }
}
