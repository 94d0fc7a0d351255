//! Runtime services: generic dispatch, merge patch, marshalling, paging, events and mapping.

pub mod dispatcher;
pub mod events;
pub mod mapper;
pub mod marshal;
pub mod pagination;
pub mod patch;

pub use dispatcher::GenericDispatcher;
pub use events::{BroadcastEmitter, EmitterRegistry, EntityEmitter, EntityEvent, EventKind};
pub use mapper::{DtoInstance, StructuralMapper};
pub use pagination::PageRequest;
pub use patch::{merge_patch, PatchEngine};
