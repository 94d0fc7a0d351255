//! Lifecycle events and the emitters that publish them.

use crate::error::ConfigError;
use crate::registry::EntityRegistry;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Name of the emitter used when a resource declares none.
pub const DEFAULT_EMITTER: &str = "default";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Patch,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Create => "CREATE",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
            EventKind::Patch => "PATCH",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityEvent {
    pub kind: EventKind,
    pub resource: String,
    pub id: Option<i64>,
    /// API form of the record; empty for deletes.
    pub payload: Map<String, Value>,
}

pub trait EntityEmitter: Send + Sync {
    fn emit(&self, event: EntityEvent);
}

/// Default emitter: fans events out to every subscriber of a broadcast channel.
#[derive(Clone)]
pub struct BroadcastEmitter {
    tx: broadcast::Sender<EntityEvent>,
}

impl BroadcastEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EntityEmitter for BroadcastEmitter {
    fn emit(&self, event: EntityEvent) {
        tracing::debug!(kind = %event.kind, resource = %event.resource, id = ?event.id, "entity event");
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

/// Named emitters; `"default"` is always present.
#[derive(Clone)]
pub struct EmitterRegistry {
    default: BroadcastEmitter,
    named: HashMap<String, Arc<dyn EntityEmitter>>,
}

impl Default for EmitterRegistry {
    fn default() -> Self {
        Self::new(BroadcastEmitter::default())
    }
}

impl EmitterRegistry {
    pub fn new(default: BroadcastEmitter) -> Self {
        let mut named: HashMap<String, Arc<dyn EntityEmitter>> = HashMap::new();
        named.insert(DEFAULT_EMITTER.to_string(), Arc::new(default.clone()));
        Self { default, named }
    }

    pub fn register(mut self, name: impl Into<String>, emitter: Arc<dyn EntityEmitter>) -> Self {
        self.named.insert(name.into(), emitter);
        self
    }

    pub fn default_emitter(&self) -> &BroadcastEmitter {
        &self.default
    }

    pub fn resolve(&self, name: Option<&str>) -> Option<Arc<dyn EntityEmitter>> {
        self.named.get(name.unwrap_or(DEFAULT_EMITTER)).cloned()
    }

    /// Every emitter a registered resource names must exist.
    pub fn verify(&self, registry: &EntityRegistry) -> Result<(), ConfigError> {
        for entry in registry.all() {
            if let Some(name) = entry.spec.events.emitter.as_deref() {
                if !self.named.contains_key(name) {
                    return Err(ConfigError::MissingReference {
                        kind: "emitter",
                        id: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<EntityEvent>>);

    impl EntityEmitter for Collecting {
        fn emit(&self, event: EntityEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn event(kind: EventKind) -> EntityEvent {
        EntityEvent {
            kind,
            resource: "Order".into(),
            id: Some(1),
            payload: Map::new(),
        }
    }

    #[tokio::test]
    async fn default_emitter_broadcasts() {
        let emitters = EmitterRegistry::default();
        let mut rx = emitters.default_emitter().subscribe();
        emitters.resolve(None).unwrap().emit(event(EventKind::Create));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Create);
    }

    #[test]
    fn named_emitters_resolve() {
        let audit = Arc::new(Collecting::default());
        let emitters = EmitterRegistry::default().register("audit", audit.clone());
        emitters.resolve(Some("audit")).unwrap().emit(event(EventKind::Patch));
        assert_eq!(audit.0.lock().unwrap().len(), 1);
        assert!(emitters.resolve(Some("missing")).is_none());
        assert_eq!(EventKind::Patch.to_string(), "PATCH");
    }
}
