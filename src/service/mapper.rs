//! Structural mapper: runs a synthesized mapper contract against runtime records.

use crate::model::record::{CREATED_BY, CREATED_ON, ID_FIELD, UPDATED_BY, UPDATED_ON};
use crate::model::{FieldAccessor, FieldValue, Instance, Record};
use crate::synth::mapper::{TO_DTO, TO_ENTITY};
use crate::synth::{DtoSpec, MapperSpec};
use std::collections::BTreeMap;

/// Fields every DTO inherits from its base.
pub const BASE_DTO_FIELDS: [&str; 5] = [ID_FIELD, CREATED_BY, UPDATED_BY, CREATED_ON, UPDATED_ON];

/// A DTO value: the declared DTO fields of one record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DtoInstance {
    type_name: String,
    values: BTreeMap<String, FieldValue>,
}

impl DtoInstance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }
}

impl FieldAccessor for DtoInstance {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    fn set(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }

    fn field_names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

/// Ignore directives split into top-level fields and nested `field -> [paths]`.
#[derive(Debug, Default)]
struct Ignores {
    fields: Vec<String>,
    nested: BTreeMap<String, Vec<String>>,
}

impl Ignores {
    fn parse(paths: &[String]) -> Self {
        let mut out = Ignores::default();
        for path in paths {
            match path.split_once('.') {
                Some((head, rest)) => out.nested.entry(head.to_string()).or_default().push(rest.to_string()),
                None => out.fields.push(path.clone()),
            }
        }
        out
    }

    fn skips(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

pub struct StructuralMapper {
    entity_type: String,
    dto_type: String,
    fields: Vec<String>,
    to_entity_ignores: Vec<String>,
    to_dto_ignores: Vec<String>,
}

impl StructuralMapper {
    /// `entity_type` is the simple name records of the entity carry.
    pub fn new(entity_type: impl Into<String>, dto: &DtoSpec, mapper: &MapperSpec) -> Self {
        let ignores = |name: &str| mapper.method(name).map(|m| m.ignore.clone()).unwrap_or_default();
        let mut fields: Vec<String> = BASE_DTO_FIELDS.iter().map(|f| f.to_string()).collect();
        fields.extend(dto.fields.iter().map(|f| f.name.clone()));
        Self {
            entity_type: entity_type.into(),
            dto_type: dto.name.clone(),
            fields,
            to_entity_ignores: ignores(TO_ENTITY),
            to_dto_ignores: ignores(TO_DTO),
        }
    }

    pub fn to_dto<A: FieldAccessor + ?Sized>(&self, entity: &A) -> DtoInstance {
        let mut dto = DtoInstance::new(&self.dto_type);
        copy(entity, &mut dto, &self.fields, &Ignores::parse(&self.to_dto_ignores));
        dto
    }

    pub fn to_entity<A: FieldAccessor + ?Sized>(&self, dto: &A) -> Record {
        let mut record = Record::new(&self.entity_type);
        copy(dto, &mut record, &self.fields, &Ignores::parse(&self.to_entity_ignores));
        record
    }

    pub fn to_list<A: FieldAccessor>(&self, entities: &[A]) -> Vec<DtoInstance> {
        entities.iter().map(|e| self.to_dto(e)).collect()
    }
}

fn copy<S, T>(source: &S, target: &mut T, fields: &[String], ignores: &Ignores)
where
    S: FieldAccessor + ?Sized,
    T: FieldAccessor + ?Sized,
{
    for field in fields {
        if ignores.skips(field) {
            continue;
        }
        let Some(value) = source.get(field) else {
            continue;
        };
        let value = match ignores.nested.get(field.as_str()) {
            Some(paths) => prune(value, &Ignores::parse(paths)),
            None => value.clone(),
        };
        target.set(field, value);
    }
}

/// Drop ignored paths from related values, leaving everything else as is.
fn prune(value: &FieldValue, ignores: &Ignores) -> FieldValue {
    match value {
        FieldValue::Related(instance) => {
            let source = instance.unwrap_proxy();
            let mut record = Record::new(source.type_name());
            for (name, v) in source.values() {
                if ignores.skips(name) {
                    continue;
                }
                let v = match ignores.nested.get(name.as_str()) {
                    Some(paths) => prune(v, &Ignores::parse(paths)),
                    None => v.clone(),
                };
                record.set(name, v);
            }
            FieldValue::Related(Box::new(Instance::Loaded(record)))
        }
        FieldValue::List(items) => FieldValue::List(items.iter().map(|i| prune(i, ignores)).collect()),
        other => other.clone(),
    }
}
