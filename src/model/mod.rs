//! Record type model: declared types, field catalogs and runtime values.

pub mod catalog;
pub mod record;
pub mod types;
pub mod value;

pub use catalog::{ElementType, FieldCatalog, FieldDescriptor};
pub use record::{FieldDecl, RecordType, TypeCatalog, BASE_RECORD};
pub use types::{ContainerKind, TypeTag};
pub use value::{CoercionError, FieldAccessor, FieldValue, Instance, LazyProxy, Record};
