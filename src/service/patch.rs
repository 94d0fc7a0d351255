//! JSON merge patch (RFC 7396) applied to stored records.

use crate::error::AppError;
use crate::model::record::{CREATED_BY, CREATED_ON, ID_FIELD};
use crate::registry::RegistryEntry;
use crate::service::dispatcher::{not_found, GenericDispatcher};
use crate::service::events::EventKind;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Apply `patch` to `target`: object members merge recursively, `null` removes,
/// any non-object patch replaces the target outright.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in patch {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[derive(Clone)]
pub struct PatchEngine {
    dispatcher: Arc<GenericDispatcher>,
}

impl PatchEngine {
    pub fn new(dispatcher: Arc<GenericDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Merge `document` into the record `id` and store the result; `createdOn`,
    /// `createdBy` and `id` always keep their stored values.
    pub async fn patch(
        &self,
        entry: &RegistryEntry,
        id: i64,
        document: &Value,
        actor: Option<&str>,
    ) -> Result<Map<String, Value>, AppError> {
        if !document.is_object() {
            return Err(AppError::BadMergePatch("merge patch document must be a JSON object".into()));
        }
        let dispatcher = &self.dispatcher;
        let mut tx = dispatcher.begin().await?;
        let existing = dispatcher
            .load_in(tx.as_mut(), entry, id)
            .await?
            .ok_or_else(|| not_found(entry, id))?;
        let before = dispatcher.marshal(entry, &existing);

        let mut merged = Value::Object(before.clone());
        merge_patch(&mut merged, document);
        let Value::Object(mut merged) = merged else {
            return Err(AppError::Unexpected("merge produced a non-object".into()));
        };
        for field in [CREATED_ON, CREATED_BY] {
            match before.get(field) {
                Some(v) => merged.insert(field.to_string(), v.clone()),
                None => merged.remove(field),
            };
        }
        merged.insert(ID_FIELD.to_string(), Value::from(id));

        let saved = dispatcher
            .update_in(tx.as_mut(), entry, &merged, actor)
            .await
            .map_err(|e| match e {
                AppError::BadRequest(msg) => AppError::BadMergePatch(msg),
                other => other,
            })?;
        tx.commit().await?;
        let map = dispatcher.marshal(entry, &saved);
        tracing::debug!(resource = %entry.resource_name, id, "patched");
        if entry.spec.events.on_patch {
            dispatcher.emit(entry, EventKind::Patch, Some(id), map.clone());
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(target: Value, patch: Value) -> Value {
        let mut target = target;
        merge_patch(&mut target, &patch);
        target
    }

    #[test]
    fn rfc7396_examples() {
        let cases = [
            (json!({"a": "b"}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "b"}), json!({"b": "c"}), json!({"a": "b", "b": "c"})),
            (json!({"a": "b"}), json!({"a": null}), json!({})),
            (json!({"a": "b", "b": "c"}), json!({"a": null}), json!({"b": "c"})),
            (json!({"a": ["b"]}), json!({"a": "c"}), json!({"a": "c"})),
            (json!({"a": "c"}), json!({"a": ["b"]}), json!({"a": ["b"]})),
            (json!({"a": {"b": "c"}}), json!({"a": {"b": "d", "c": null}}), json!({"a": {"b": "d"}})),
            (json!({"a": [{"b": "c"}]}), json!({"a": [1]}), json!({"a": [1]})),
            (json!(["a", "b"]), json!(["c", "d"]), json!(["c", "d"])),
            (json!({"a": "b"}), json!(["c"]), json!(["c"])),
            (json!({"a": "foo"}), json!(null), json!(null)),
            (json!({"a": "foo"}), json!("bar"), json!("bar")),
            (json!({"e": null}), json!({"a": 1}), json!({"e": null, "a": 1})),
            (json!([1, 2]), json!({"a": "b", "c": null}), json!({"a": "b"})),
            (json!({}), json!({"a": {"bb": {"ccc": null}}}), json!({"a": {"bb": {}}})),
        ];
        for (target, patch, expected) in cases {
            assert_eq!(merged(target.clone(), patch.clone()), expected, "{} + {}", target, patch);
        }
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let start = json!({"name": "a", "tags": ["x"], "meta": {"k": 1, "drop": true}});
        let patch = json!({"name": "b", "meta": {"drop": null, "n": 2}});
        let once = merged(start.clone(), patch.clone());
        assert_eq!(merged(once.clone(), patch), once);
    }
}
