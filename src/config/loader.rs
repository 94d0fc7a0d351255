//! Load a schema document from JSON text or a file and build the type catalog.

use crate::config::types::SchemaDocument;
use crate::config::validate;
use crate::error::ConfigError;
use crate::model::TypeCatalog;
use std::path::Path;

/// Parse, validate and catalog a schema document.
pub fn load_schema_str(raw: &str) -> Result<TypeCatalog, ConfigError> {
    let doc: SchemaDocument = serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    catalog_from_document(doc)
}

pub fn load_schema_file(path: impl AsRef<Path>) -> Result<TypeCatalog, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let catalog = load_schema_str(&raw)?;
    tracing::info!(path = %path.display(), types = catalog.types().len(), "schema loaded");
    Ok(catalog)
}

pub fn catalog_from_document(doc: SchemaDocument) -> Result<TypeCatalog, ConfigError> {
    validate(&doc)?;
    TypeCatalog::new(doc.types, doc.aliases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpVerb, Scope};
    use crate::model::TypeTag;

    const SCHEMA: &str = r#"{
        "version": 1,
        "aliases": { "OrderLines": "List<OrderLine>" },
        "types": [
            {
                "name": "Order", "package": "shop", "extends": "BaseRecord", "persistable": true,
                "fields": [
                    { "name": "total", "type": "double" },
                    { "name": "lines", "type": "OrderLines" },
                    { "name": "INSTANCES", "type": "long", "static": true }
                ],
                "resource": { "disabledFor": ["DELETE"], "scope": "REQUEST" }
            },
            { "name": "OrderLine", "package": "shop", "fields": [{ "name": "sku", "type": "java.lang.String" }] }
        ]
    }"#;

    #[test]
    fn loads_types_aliases_and_resources() {
        let catalog = load_schema_str(SCHEMA).unwrap();
        let order = catalog.get("Order").unwrap();
        assert!(order.persistable);
        assert_eq!(order.fields[0].ty, TypeTag::Double);
        assert!(order.fields[2].is_static);
        let resource = order.resource.as_ref().unwrap();
        assert_eq!(resource.disabled_for, vec![HttpVerb::Delete]);
        assert_eq!(resource.scope, Scope::Request);
        assert_eq!(catalog.get("OrderLine").unwrap().fields[0].ty, TypeTag::String);
        assert_eq!(
            catalog.resolve_alias(&TypeTag::named("OrderLines")),
            TypeTag::list_of(TypeTag::named("OrderLine"))
        );
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(matches!(load_schema_str("{"), Err(ConfigError::Load(_))));
        assert!(matches!(
            load_schema_file("/definitely/not/here.json"),
            Err(ConfigError::Load(_))
        ));
    }
}
