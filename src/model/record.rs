//! Record type handles and the catalog of every declared type.

use crate::config::ResourceConfig;
use crate::error::ConfigError;
use crate::model::TypeTag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Name of the built-in base record type every resource must extend.
pub const BASE_RECORD: &str = "BaseRecord";
pub const BASE_RECORD_PACKAGE: &str = "resource_sdk.model";

pub const ID_FIELD: &str = "id";
pub const CREATED_BY: &str = "createdBy";
pub const UPDATED_BY: &str = "updatedBy";
pub const CREATED_ON: &str = "createdOn";
pub const UPDATED_ON: &str = "updatedOn";

/// Prefix of compiler/runtime synthetic field names.
pub const SYNTHETIC_PREFIX: &str = "$$";
/// Prefix of fields injected by the persistence framework.
pub const PERSISTENCE_PREFIX: &str = "_persistence_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.name.starts_with(SYNTHETIC_PREFIX)
    }

    /// Host-runtime-internal: synthetic or persistence-framework fields.
    pub fn is_internal(&self) -> bool {
        is_internal_name(&self.name)
    }
}

pub fn is_internal_name(name: &str) -> bool {
    name.starts_with(SYNTHETIC_PREFIX) || name.starts_with(PERSISTENCE_PREFIX)
}

/// A record type handle: the unit of registration, synthesis and dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub extends: Option<String>,
    /// Persistable-record marker.
    #[serde(default)]
    pub persistable: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Resource-declaration marker and its configuration.
    #[serde(default)]
    pub resource: Option<ResourceConfig>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            extends: None,
            persistable: false,
            fields: Vec::new(),
            resource: None,
        }
    }

    /// Persistable resource extending the base record; handy for hosts building types in code.
    pub fn resource(name: impl Into<String>, package: impl Into<String>, config: ResourceConfig) -> Self {
        let mut ty = Self::new(name, package);
        ty.extends = Some(BASE_RECORD.into());
        ty.persistable = true;
        ty.resource = Some(config);
        ty
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn declared_field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn extends_base_record(&self) -> bool {
        self.extends.as_deref() == Some(BASE_RECORD)
    }

    /// The built-in base record: identity plus audit fields.
    pub fn base_record() -> Self {
        Self::new(BASE_RECORD, BASE_RECORD_PACKAGE)
            .with_field(ID_FIELD, TypeTag::Long)
            .with_field(CREATED_BY, TypeTag::String)
            .with_field(UPDATED_BY, TypeTag::String)
            .with_field(CREATED_ON, TypeTag::Instant)
            .with_field(UPDATED_ON, TypeTag::Instant)
    }
}

/// Every declared record type and alias, plus the built-in base record.
#[derive(Clone, Debug)]
pub struct TypeCatalog {
    types: Vec<Arc<RecordType>>,
    by_name: HashMap<String, usize>,
    aliases: BTreeMap<String, TypeTag>,
    base: Arc<RecordType>,
}

impl TypeCatalog {
    pub fn new(types: Vec<RecordType>, aliases: BTreeMap<String, TypeTag>) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::new();
        for (i, ty) in types.iter().enumerate() {
            if ty.name == BASE_RECORD {
                return Err(ConfigError::Validation(format!("type name '{}' is reserved", BASE_RECORD)));
            }
            if by_name.insert(ty.name.clone(), i).is_some() {
                return Err(ConfigError::Validation(format!("duplicate type name: {}", ty.name)));
            }
        }
        if let Some(clash) = aliases.keys().find(|a| by_name.contains_key(a.as_str())) {
            return Err(ConfigError::Validation(format!("alias '{}' clashes with a record type", clash)));
        }
        Ok(Self {
            types: types.into_iter().map(Arc::new).collect(),
            by_name,
            aliases,
            base: Arc::new(RecordType::base_record()),
        })
    }

    pub fn types(&self) -> &[Arc<RecordType>] {
        &self.types
    }

    pub fn base_record(&self) -> &RecordType {
        &self.base
    }

    /// Look up a record type by simple name (the base record included).
    pub fn get(&self, name: &str) -> Option<&RecordType> {
        if name == BASE_RECORD {
            return Some(&self.base);
        }
        self.by_name.get(name).map(|&i| self.types[i].as_ref())
    }

    pub fn get_arc(&self, name: &str) -> Option<Arc<RecordType>> {
        self.by_name.get(name).map(|&i| self.types[i].clone())
    }

    pub fn alias(&self, name: &str) -> Option<&TypeTag> {
        self.aliases.get(name)
    }

    /// Follow alias declarations until a structural type or a non-alias name is reached.
    pub fn resolve_alias(&self, tag: &TypeTag) -> TypeTag {
        let mut current = tag.clone();
        let mut seen = HashSet::new();
        while let TypeTag::Named(name) = &current {
            if !seen.insert(name.clone()) {
                break;
            }
            match self.aliases.get(name) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        current
    }

    /// Record type referenced by a tag, after alias resolution.
    pub fn record_of(&self, tag: &TypeTag) -> Option<&RecordType> {
        match self.resolve_alias(tag) {
            TypeTag::Named(name) => self.get(&name),
            _ => None,
        }
    }

    /// Supertype chain of `ty`, root first, `ty` last.
    pub fn lineage<'a>(&'a self, ty: &'a RecordType) -> Vec<&'a RecordType> {
        let mut chain = vec![ty];
        let mut seen = HashSet::new();
        seen.insert(ty.name.as_str());
        let mut current = ty;
        while let Some(parent) = current.extends.as_deref().and_then(|p| self.get(p)) {
            if !seen.insert(parent.name.as_str()) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Declared and inherited fields in lineage order.
    pub fn all_fields<'a>(&'a self, ty: &'a RecordType) -> Vec<&'a FieldDecl> {
        self.lineage(ty).into_iter().flat_map(|t| t.fields.iter()).collect()
    }

    pub fn field_of<'a>(&'a self, ty: &'a RecordType, name: &str) -> Option<&'a FieldDecl> {
        self.lineage(ty)
            .into_iter()
            .rev()
            .find_map(|t| t.declared_field(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        let order = RecordType::resource("Order", "shop", ResourceConfig::default())
            .with_field("total", TypeTag::Double)
            .with_field("lines", TypeTag::named("OrderLines"));
        let line = RecordType::new("OrderLine", "shop").with_field("sku", TypeTag::String);
        let mut aliases = BTreeMap::new();
        aliases.insert("OrderLines".to_string(), TypeTag::named("LineBag"));
        aliases.insert("LineBag".to_string(), TypeTag::list_of(TypeTag::named("OrderLine")));
        TypeCatalog::new(vec![order, line], aliases).unwrap()
    }

    #[test]
    fn inherited_fields_come_first() {
        let catalog = catalog();
        let order = catalog.get("Order").unwrap();
        let names: Vec<_> = catalog.all_fields(order).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "createdBy", "updatedBy", "createdOn", "updatedOn", "total", "lines"]);
        assert_eq!(catalog.field_of(order, "createdOn").unwrap().ty, TypeTag::Instant);
    }

    #[test]
    fn aliases_resolve_through_chains() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve_alias(&TypeTag::named("OrderLines")),
            TypeTag::list_of(TypeTag::named("OrderLine"))
        );
        assert_eq!(catalog.resolve_alias(&TypeTag::Long), TypeTag::Long);
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        let a = RecordType::new("A", "p");
        assert!(TypeCatalog::new(vec![a.clone(), a], BTreeMap::new()).is_err());
        assert!(TypeCatalog::new(vec![RecordType::new(BASE_RECORD, "p")], BTreeMap::new()).is_err());
    }
}
