//! Structural artifact descriptions handed to a source renderer.

use crate::config::{HttpVerb, Scope};
use crate::model::{ContainerKind, TypeTag};
use crate::service::events::EventKind;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedArtifact {
    Dto(DtoSpec),
    Mapper(MapperSpec),
    Service(ServiceSpec),
    Controller(ControllerSpec),
}

impl GeneratedArtifact {
    pub fn name(&self) -> &str {
        match self {
            GeneratedArtifact::Dto(a) => &a.name,
            GeneratedArtifact::Mapper(a) => &a.name,
            GeneratedArtifact::Service(a) => &a.name,
            GeneratedArtifact::Controller(a) => &a.name,
        }
    }

    pub fn qualified_name(&self) -> String {
        let (package, name) = match self {
            GeneratedArtifact::Dto(a) => (&a.package, &a.name),
            GeneratedArtifact::Mapper(a) => (&a.package, &a.name),
            GeneratedArtifact::Service(a) => (&a.package, &a.name),
            GeneratedArtifact::Controller(a) => (&a.package, &a.name),
        };
        crate::config::resolved::sub_package(package, name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtoSpec {
    pub name: String,
    pub package: String,
    pub base: String,
    /// Qualified name of the record type this DTO mirrors.
    pub source: String,
    pub fields: Vec<DtoField>,
    pub accessors: Vec<Accessor>,
    /// equals / hashCode / toString; empty when there are no fields.
    pub common_methods: Vec<CommonMethod>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DtoSpec {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn common_method(&self, kind: CommonMethodKind) -> Option<&CommonMethod> {
        self.common_methods.iter().find(|m| m.kind == kind)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtoField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
    /// Empty container the field starts out as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<ContainerKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    Getter,
    Setter,
    AddItem,
    PutEntry,
    Clear,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub name: String,
    pub kind: AccessorKind,
    pub field: String,
    /// Parameter types, in order.
    pub params: Vec<TypeTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<TypeTag>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommonMethodKind {
    Equals,
    HashCode,
    ToString,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonMethod {
    pub kind: CommonMethodKind,
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperSpec {
    pub name: String,
    pub package: String,
    pub entity: String,
    pub dto: String,
    pub methods: Vec<MapperMethod>,
}

impl MapperSpec {
    pub fn method(&self, name: &str) -> Option<&MapperMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperMethod {
    pub name: String,
    pub param: String,
    pub returns: String,
    /// Nested targets the structural mapper must not traverse.
    pub ignore: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    pub package: String,
    pub entity: String,
    pub dto: String,
    pub mapper: String,
    pub repository: String,
    pub base_methods: Vec<String>,
    pub overrides: Vec<ServiceOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter: Option<String>,
}

impl ServiceSpec {
    pub fn override_for(&self, method: &str) -> Option<&ServiceOverride> {
        self.overrides.iter().find(|o| o.method == method)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverride {
    pub method: String,
    pub event: EventKind,
    pub emission: Emission,
}

/// How an override publishes its event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Emission {
    /// `emitter.emit(...)` on the declared emitter.
    Custom { emitter: String },
    /// `fireEvent(...)` on the default channel.
    Fire,
}

impl Emission {
    pub fn call(&self) -> &'static str {
        match self {
            Emission::Custom { .. } => "emitter.emit",
            Emission::Fire => "fireEvent",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSpec {
    pub name: String,
    pub package: String,
    pub path: String,
    pub scope: Scope,
    pub service: String,
    pub endpoints: Vec<Endpoint>,
}

impl ControllerSpec {
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub verb: HttpVerb,
    /// Relative to the controller path.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QueryParam>,
    pub behavior: EndpointBehavior,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParam {
    pub name: String,
    pub default: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointBehavior {
    /// Delegates to the service; `status` on success.
    Dispatch {
        service_call: String,
        status: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_limit: Option<u32>,
    },
    /// Always fails with `status` and `detail`.
    Disabled { status: u16, detail: String },
}
