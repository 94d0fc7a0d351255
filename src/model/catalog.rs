//! Field catalog: the ordered, filtered view of a record type's fields.

use crate::model::{FieldDecl, RecordType, TypeCatalog, TypeTag};
use crate::model::types::ContainerKind;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
    pub is_collection: bool,
    /// Container to initialize the field with, when it is a collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementType>,
}

/// Element shape of a collection field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ElementType {
    Single { ty: TypeTag },
    Entry { key: TypeTag, value: TypeTag },
}

impl FieldDescriptor {
    pub fn is_boolean(&self) -> bool {
        self.ty.is_boolean()
    }
}

pub struct FieldCatalog<'a> {
    types: &'a TypeCatalog,
}

impl<'a> FieldCatalog<'a> {
    pub fn new(types: &'a TypeCatalog) -> Self {
        Self { types }
    }

    /// Declared fields of `ty` that survive filtering, in declaration order.
    pub fn descriptors(&self, ty: &RecordType, ignored: &BTreeSet<String>) -> Vec<FieldDescriptor> {
        ty.fields
            .iter()
            .filter(|f| !is_excluded(f, ignored))
            .map(|f| self.describe(f))
            .collect()
    }

    /// Inherited plus declared fields, base record first.
    pub fn all_descriptors(&self, ty: &RecordType, ignored: &BTreeSet<String>) -> Vec<FieldDescriptor> {
        self.types
            .all_fields(ty)
            .into_iter()
            .filter(|f| !is_excluded(f, ignored))
            .map(|f| self.describe(f))
            .collect()
    }

    pub fn describe(&self, decl: &FieldDecl) -> FieldDescriptor {
        let resolved = self.types.resolve_alias(&decl.ty);
        let element = match &resolved {
            TypeTag::List(t) | TypeTag::Set(t) | TypeTag::Collection(t) => {
                Some(ElementType::Single { ty: (**t).clone() })
            }
            TypeTag::Map(k, v) => Some(ElementType::Entry {
                key: (**k).clone(),
                value: (**v).clone(),
            }),
            _ => None,
        };
        FieldDescriptor {
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            is_collection: element.is_some(),
            container: resolved.container(),
            element,
        }
    }
}

/// Synthetic, static and ignored fields never reach DTOs or API maps.
pub fn is_excluded(decl: &FieldDecl, ignored: &BTreeSet<String>) -> bool {
    decl.is_synthetic() || decl.is_static || ignored.contains(&decl.name)
}
