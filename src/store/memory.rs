//! In-memory repository adapter used by tests and the demo server.

use crate::error::RepositoryError;
use crate::model::{FieldAccessor, Instance, LazyProxy, Record};
use crate::store::{RepositoryPort, Transaction};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
struct Tables {
    rows: HashMap<String, BTreeMap<i64, Record>>,
    next_id: HashMap<String, i64>,
}

/// Transactions are serialized: each holds the store lock and works on a copy until commit.
#[derive(Clone)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
    proxied: bool,
}

impl InMemoryRepository {
    /// Repository with one empty table per type name; other names are rejected.
    pub fn new<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = Tables::default();
        for name in type_names {
            let name = name.into();
            tables.next_id.insert(name.clone(), 1);
            tables.rows.insert(name, BTreeMap::new());
        }
        Self {
            tables: Arc::new(Mutex::new(tables)),
            proxied: false,
        }
    }

    /// Hand out loaded records wrapped in lazy-loading proxies, like an ORM session does.
    pub fn with_lazy_proxies(mut self) -> Self {
        self.proxied = true;
        self
    }

    /// Committed record count for `type_name`.
    pub async fn count(&self, type_name: &str) -> usize {
        self.tables
            .lock()
            .await
            .rows
            .get(type_name)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl RepositoryPort for InMemoryRepository {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepositoryError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            proxied: self.proxied,
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    proxied: bool,
}

impl MemoryTransaction {
    fn table(&mut self, type_name: &str) -> Result<&mut BTreeMap<i64, Record>, RepositoryError> {
        self.working
            .rows
            .get_mut(type_name)
            .ok_or_else(|| RepositoryError::UnknownType(type_name.to_string()))
    }

    fn wrap(&self, record: Record) -> Instance {
        if self.proxied {
            Instance::Proxy(LazyProxy {
                handler: format!("{}$Proxy", record.type_name()),
                target: record,
            })
        } else {
            Instance::Loaded(record)
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_page(
        &mut self,
        type_name: &str,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Instance>, RepositoryError> {
        let rows: Vec<Record> = {
            let table = self.table(type_name)?;
            let iter = table.values().skip(offset.unwrap_or(0) as usize).cloned();
            match limit {
                Some(limit) => iter.take(limit as usize).collect(),
                None => iter.collect(),
            }
        };
        Ok(rows.into_iter().map(|r| self.wrap(r)).collect())
    }

    async fn find_by_id(&mut self, type_name: &str, id: i64) -> Result<Option<Instance>, RepositoryError> {
        let found = self.table(type_name)?.get(&id).cloned();
        Ok(found.map(|r| self.wrap(r)))
    }

    async fn persist(&mut self, mut record: Record) -> Result<Record, RepositoryError> {
        let type_name = record.type_name().to_string();
        self.table(&type_name)?;
        let next = self.working.next_id.entry(type_name.clone()).or_insert(1);
        let id = *next;
        *next += 1;
        record.set_id(id);
        self.table(&type_name)?.insert(id, record.clone());
        Ok(record)
    }

    async fn merge(&mut self, record: Record) -> Result<Record, RepositoryError> {
        let id = record.id().ok_or(RepositoryError::MissingId)?;
        let type_name = record.type_name().to_string();
        self.table(&type_name)?.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&mut self, type_name: &str, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.table(type_name)?.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryTransaction { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;

    fn note(text: &str) -> Record {
        Record::new("Note").with("text", FieldValue::Text(text.into()))
    }

    #[tokio::test]
    async fn persist_assigns_sequential_ids_and_commit_publishes() {
        let repo = InMemoryRepository::new(["Note"]);
        let mut tx = repo.begin().await.unwrap();
        assert_eq!(tx.persist(note("a")).await.unwrap().id(), Some(1));
        assert_eq!(tx.persist(note("b")).await.unwrap().id(), Some(2));
        tx.commit().await.unwrap();
        assert_eq!(repo.count("Note").await, 2);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let repo = InMemoryRepository::new(["Note"]);
        {
            let mut tx = repo.begin().await.unwrap();
            tx.persist(note("lost")).await.unwrap();
        }
        assert_eq!(repo.count("Note").await, 0);
    }

    #[tokio::test]
    async fn paging_and_proxies() {
        let repo = InMemoryRepository::new(["Note"]).with_lazy_proxies();
        let mut tx = repo.begin().await.unwrap();
        for t in ["a", "b", "c", "d"] {
            tx.persist(note(t)).await.unwrap();
        }
        let page = tx.find_page("Note", Some(1), Some(2)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|i| i.unwrap_proxy().id()).collect();
        assert_eq!(ids, vec![Some(2), Some(3)]);
        assert!(matches!(page[0], Instance::Proxy(_)));
        assert_eq!(tx.find_page("Note", None, None).await.unwrap().len(), 4);
        assert!(tx.delete("Note", 4).await.unwrap());
        assert!(!tx.delete("Note", 4).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_type_and_missing_id() {
        let repo = InMemoryRepository::new(["Note"]);
        let mut tx = repo.begin().await.unwrap();
        assert_eq!(
            tx.find_by_id("Ghost", 1).await.unwrap_err(),
            RepositoryError::UnknownType("Ghost".into())
        );
        assert_eq!(tx.merge(note("x")).await.unwrap_err(), RepositoryError::MissingId);
    }
}
