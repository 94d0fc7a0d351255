//! Generic CRUD over any registered record type.

use crate::error::AppError;
use crate::model::record::{CREATED_BY, CREATED_ON, ID_FIELD, UPDATED_BY, UPDATED_ON};
use crate::model::{FieldAccessor, Record, TypeCatalog, TypeTag};
use crate::registry::RegistryEntry;
use crate::service::events::{EmitterRegistry, EntityEvent, EventKind};
use crate::service::marshal::{from_map, id_of, to_map};
use crate::store::{RepositoryPort, Transaction};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Clock = fn() -> DateTime<Utc>;

const AUDIT_FIELDS: [&str; 4] = [CREATED_BY, UPDATED_BY, CREATED_ON, UPDATED_ON];

pub struct GenericDispatcher {
    repository: Arc<dyn RepositoryPort>,
    catalog: Arc<TypeCatalog>,
    emitters: EmitterRegistry,
    clock: Clock,
}

impl GenericDispatcher {
    pub fn new(repository: Arc<dyn RepositoryPort>, catalog: Arc<TypeCatalog>, emitters: EmitterRegistry) -> Self {
        Self {
            repository,
            catalog,
            emitters,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn emitters(&self) -> &EmitterRegistry {
        &self.emitters
    }

    pub(crate) async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        Ok(self.repository.begin().await?)
    }

    /// Offset applies when > 0, limit when > 0.
    pub async fn find_all(&self, entry: &RegistryEntry, offset: u32, limit: u32) -> Result<Vec<Map<String, Value>>, AppError> {
        tracing::debug!(resource = %entry.resource_name, offset, limit, "find_all");
        let mut tx = self.begin().await?;
        let rows = tx
            .find_page(
                &entry.record_type.name,
                (offset > 0).then_some(offset),
                (limit > 0).then_some(limit),
            )
            .await?;
        tx.commit().await?;
        Ok(rows.iter().map(|i| self.marshal(entry, i.unwrap_proxy())).collect())
    }

    /// `Ok(None)` when no record has `id`.
    pub async fn find_by_id(&self, entry: &RegistryEntry, id: i64) -> Result<Option<Map<String, Value>>, AppError> {
        tracing::debug!(resource = %entry.resource_name, id, "find_by_id");
        let mut tx = self.begin().await?;
        let found = self.load_in(tx.as_mut(), entry, id).await?;
        tx.commit().await?;
        Ok(found.map(|r| self.marshal(entry, &r)))
    }

    /// Any `id` in the body is ignored; the store assigns one.
    pub async fn create(
        &self,
        entry: &RegistryEntry,
        body: &Map<String, Value>,
        actor: Option<&str>,
    ) -> Result<Map<String, Value>, AppError> {
        let mut record = self.unmarshal(entry, body)?;
        record.remove(ID_FIELD);
        for field in AUDIT_FIELDS {
            record.remove(field);
        }
        record.pre_persist((self.clock)(), actor);
        let mut tx = self.begin().await?;
        let saved = tx.persist(record).await?;
        tx.commit().await?;
        let map = self.marshal(entry, &saved);
        tracing::debug!(resource = %entry.resource_name, id = ?saved.id(), "created");
        if entry.spec.events.on_create {
            self.emit(entry, EventKind::Create, saved.id(), map.clone());
        }
        Ok(map)
    }

    /// Full replacement of an existing record; the body must carry its `id`.
    pub async fn update(
        &self,
        entry: &RegistryEntry,
        body: &Map<String, Value>,
        actor: Option<&str>,
    ) -> Result<Map<String, Value>, AppError> {
        let mut tx = self.begin().await?;
        let saved = self.update_in(tx.as_mut(), entry, body, actor).await?;
        tx.commit().await?;
        let map = self.marshal(entry, &saved);
        if entry.spec.events.on_update {
            self.emit(entry, EventKind::Update, saved.id(), map.clone());
        }
        Ok(map)
    }

    /// Deleting a missing id is a no-op; returns whether a record was removed.
    pub async fn delete(&self, entry: &RegistryEntry, id: i64) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;
        let removed = tx.delete(&entry.record_type.name, id).await?;
        tx.commit().await?;
        tracing::debug!(resource = %entry.resource_name, id, removed, "delete");
        if removed && entry.spec.events.on_delete {
            self.emit(entry, EventKind::Delete, Some(id), Map::new());
        }
        Ok(removed)
    }

    pub(crate) async fn load_in(
        &self,
        tx: &mut dyn Transaction,
        entry: &RegistryEntry,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        Ok(tx
            .find_by_id(&entry.record_type.name, id)
            .await?
            .map(|instance| instance.into_record()))
    }

    pub(crate) async fn update_in(
        &self,
        tx: &mut dyn Transaction,
        entry: &RegistryEntry,
        body: &Map<String, Value>,
        actor: Option<&str>,
    ) -> Result<Record, AppError> {
        let id = id_of(body).ok_or_else(|| AppError::BadRequest("update requires an id".into()))?;
        let existing = self.load_in(tx, entry, id).await?.ok_or_else(|| not_found(entry, id))?;
        let mut record = self.unmarshal(entry, body)?;
        for field in AUDIT_FIELDS {
            record.remove(field);
            if let Some(kept) = existing.get(field) {
                record.set(field, kept.clone());
            }
        }
        self.carry_related_collections(entry, &existing, &mut record);
        record.set_id(id);
        record.pre_update((self.clock)(), actor);
        Ok(tx.merge(record).await?)
    }

    pub(crate) fn marshal(&self, entry: &RegistryEntry, record: &Record) -> Map<String, Value> {
        to_map(record, &entry.record_type, &self.catalog, &entry.spec.ignored_fields)
    }

    fn unmarshal(&self, entry: &RegistryEntry, body: &Map<String, Value>) -> Result<Record, AppError> {
        from_map(body, &entry.record_type, &self.catalog, &entry.spec.ignored_fields)
    }

    // Related collections are only summarized over the API, so the stored value stands.
    fn carry_related_collections(&self, entry: &RegistryEntry, existing: &Record, record: &mut Record) {
        for decl in self.catalog.all_fields(&entry.record_type) {
            let related_many = match self.catalog.resolve_alias(&decl.ty) {
                TypeTag::List(t) | TypeTag::Set(t) | TypeTag::Collection(t) => self.catalog.record_of(&t).is_some(),
                _ => false,
            };
            if related_many {
                if let Some(value) = existing.get(&decl.name) {
                    record.set(&decl.name, value.clone());
                }
            }
        }
    }

    pub(crate) fn emit(&self, entry: &RegistryEntry, kind: EventKind, id: Option<i64>, payload: Map<String, Value>) {
        let name = entry.spec.events.emitter.as_deref();
        match self.emitters.resolve(name) {
            Some(emitter) => emitter.emit(EntityEvent {
                kind,
                resource: entry.resource_name.clone(),
                id,
                payload,
            }),
            None => tracing::warn!(resource = %entry.resource_name, emitter = ?name, "no such emitter, event dropped"),
        }
    }
}

pub(crate) fn not_found(entry: &RegistryEntry, id: i64) -> AppError {
    AppError::NotFound(format!("{} with id {} not found", entry.resource_name, id))
}
