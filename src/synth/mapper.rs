//! Mapper contract: entity <-> DTO conversions with nested-ignore directives.

use crate::config::resolved::sub_package;
use crate::config::ResourceSpec;
use crate::model::RecordType;
use crate::synth::artifact::{MapperMethod, MapperSpec};

pub const TO_ENTITY: &str = "toEntity";
pub const TO_DTO: &str = "toDto";
pub const TO_LIST: &str = "toList";

pub fn mapper_name(ty: &RecordType) -> String {
    format!("{}Mapper", ty.name)
}

pub fn synthesize(ty: &RecordType, spec: &ResourceSpec) -> MapperSpec {
    let entity = ty.qualified_name();
    let dto = sub_package(&spec.dto_package(), &spec.dto_name);
    let ignore: Vec<String> = spec.ignored_nested_fields.iter().cloned().collect();
    MapperSpec {
        name: mapper_name(ty),
        package: sub_package(&spec.package, "mapper"),
        methods: vec![
            MapperMethod {
                name: TO_ENTITY.into(),
                param: dto.clone(),
                returns: entity.clone(),
                ignore: ignore.clone(),
            },
            MapperMethod {
                name: TO_DTO.into(),
                param: entity.clone(),
                returns: dto.clone(),
                ignore,
            },
            MapperMethod {
                name: TO_LIST.into(),
                param: format!("List<{}>", entity),
                returns: format!("List<{}>", dto),
                ignore: Vec::new(),
            },
        ],
        entity,
        dto,
    }
}
