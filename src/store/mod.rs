//! Repository port: the persistence boundary the dispatcher runs against.
//!
//! Every dispatcher operation opens one [`Transaction`], works inside it and commits once.
//! Dropping a transaction without committing discards its writes.

pub mod memory;

pub use memory::InMemoryRepository;

use crate::error::RepositoryError;
use crate::model::{Instance, Record};
use async_trait::async_trait;

#[async_trait]
pub trait RepositoryPort: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepositoryError>;
}

#[async_trait]
pub trait Transaction: Send {
    /// All records of `type_name` in id order; `None` means no offset / no limit.
    async fn find_page(
        &mut self,
        type_name: &str,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Instance>, RepositoryError>;

    async fn find_by_id(&mut self, type_name: &str, id: i64) -> Result<Option<Instance>, RepositoryError>;

    /// Insert a new record, assigning its id.
    async fn persist(&mut self, record: Record) -> Result<Record, RepositoryError>;

    /// Write a record that already carries an id.
    async fn merge(&mut self, record: Record) -> Result<Record, RepositoryError>;

    /// Returns whether a record was removed.
    async fn delete(&mut self, type_name: &str, id: i64) -> Result<bool, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
