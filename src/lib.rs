//! Resource SDK: declarative CRUD resources over record types.
//!
//! A resource declaration on a record type is normalized once into a
//! [`ResourceSpec`], then either synthesized into artifact descriptions
//! ([`Synthesizer`]) or served at runtime by the generic dispatcher behind
//! `/api/{resource}` ([`routes::app`]).

pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod registry;
pub mod response;
pub mod routes;
pub mod security;
pub mod service;
pub mod state;
pub mod store;
pub mod synth;
pub mod telemetry;

pub use config::{build_spec, load_schema_file, load_schema_str, ResourceSpec, Settings, SpecCache};
pub use error::{AppError, ConfigError, RepositoryError};
pub use model::{FieldAccessor, FieldValue, Record, RecordType, TypeCatalog, TypeTag};
pub use registry::{EntityRegistry, RegistryEntry};
pub use response::{success_many, success_one, Problem};
pub use routes::{app, common_routes, resource_routes};
pub use security::{Principal, SecurityEnforcer};
pub use service::{EmitterRegistry, GenericDispatcher, PatchEngine};
pub use state::AppState;
pub use store::{InMemoryRepository, RepositoryPort};
pub use synth::{GeneratedArtifact, SynthesisReport, Synthesizer};
