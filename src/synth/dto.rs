//! DTO synthesis: fields, accessors and the equals/hashCode/toString contract.

use crate::case::{add_item_name, clear_name, getter_name, put_entry_name, setter_name};
use crate::config::ResourceSpec;
use crate::model::{ElementType, FieldDescriptor, RecordType};
use crate::synth::artifact::{Accessor, AccessorKind, CommonMethod, CommonMethodKind, DtoField, DtoSpec};

pub const BASE_DTO: &str = "BaseDTO";

pub fn synthesize(ty: &RecordType, spec: &ResourceSpec, descriptors: &[FieldDescriptor]) -> DtoSpec {
    let fields: Vec<DtoField> = descriptors
        .iter()
        .map(|d| DtoField {
            name: d.name.clone(),
            ty: d.ty.clone(),
            initializer: d.container,
        })
        .collect();

    let accessors = descriptors.iter().flat_map(accessors_for).collect();

    let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
    let common_methods = if names.is_empty() {
        Vec::new()
    } else {
        [CommonMethodKind::Equals, CommonMethodKind::HashCode, CommonMethodKind::ToString]
            .into_iter()
            .map(|kind| CommonMethod {
                kind,
                fields: names.clone(),
            })
            .collect()
    };

    let mut warnings = Vec::new();
    if fields.is_empty() {
        let msg = format!(
            "{}: no fields left to generate a DTO from; check the mapping ignore list",
            ty.qualified_name()
        );
        tracing::warn!("{}", msg);
        warnings.push(msg);
    }

    DtoSpec {
        name: spec.dto_name.clone(),
        package: spec.dto_package(),
        base: BASE_DTO.into(),
        source: ty.qualified_name(),
        fields,
        accessors,
        common_methods,
        warnings,
    }
}

fn accessors_for(d: &FieldDescriptor) -> Vec<Accessor> {
    let mut out = vec![
        Accessor {
            name: getter_name(&d.name, d.is_boolean()),
            kind: AccessorKind::Getter,
            field: d.name.clone(),
            params: vec![],
            returns: Some(d.ty.clone()),
        },
        Accessor {
            name: setter_name(&d.name),
            kind: AccessorKind::Setter,
            field: d.name.clone(),
            params: vec![d.ty.clone()],
            returns: None,
        },
    ];
    match &d.element {
        Some(ElementType::Single { ty }) => out.push(Accessor {
            name: add_item_name(&d.name),
            kind: AccessorKind::AddItem,
            field: d.name.clone(),
            params: vec![ty.clone()],
            returns: None,
        }),
        Some(ElementType::Entry { key, value }) => out.push(Accessor {
            name: put_entry_name(&d.name),
            kind: AccessorKind::PutEntry,
            field: d.name.clone(),
            params: vec![key.clone(), value.clone()],
            returns: None,
        }),
        None => {}
    }
    if d.is_collection {
        out.push(Accessor {
            name: clear_name(&d.name),
            kind: AccessorKind::Clear,
            field: d.name.clone(),
            params: vec![],
            returns: None,
        });
    }
    out
}
