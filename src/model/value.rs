//! Runtime record values, lazy-loading proxies and JSON coercion.

use crate::model::record::{CREATED_BY, CREATED_ON, ID_FIELD, UPDATED_BY, UPDATED_ON};
use crate::model::{RecordType, TypeCatalog, TypeTag};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Instant(DateTime<Utc>),
    List(Vec<FieldValue>),
    /// Keys are kept in their JSON (string) form.
    Map(BTreeMap<String, FieldValue>),
    Related(Box<Instance>),
}

/// A stored record: its type name plus field values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    type_name: String,
    values: BTreeMap<String, FieldValue>,
}

/// What the persistence host hands back: a loaded record or a lazy proxy around one.
#[derive(Clone, Debug, PartialEq)]
pub enum Instance {
    Loaded(Record),
    Proxy(LazyProxy),
}

/// Lazy-loading proxy; `handler` stands in for the interceptor state the host attaches.
#[derive(Clone, Debug, PartialEq)]
pub struct LazyProxy {
    pub handler: String,
    pub target: Record,
}

/// Field-level access to a record, implemented by the reflection adapter (`Record`)
/// and by concrete types that want to be served without it.
pub trait FieldAccessor {
    fn type_name(&self) -> &str;
    fn get(&self, field: &str) -> Option<&FieldValue>;
    fn set(&mut self, field: &str, value: FieldValue);
    fn field_names(&self) -> Vec<&str>;
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct CoercionError(pub String);

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Unloaded reference carrying only the identity, like a persistence `getReference`.
    pub fn reference(type_name: impl Into<String>, id: i64) -> Self {
        Self::new(type_name).with(ID_FIELD, FieldValue::Int(id))
    }

    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.values.remove(field)
    }

    pub fn id(&self) -> Option<i64> {
        match self.values.get(ID_FIELD) {
            Some(FieldValue::Int(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn set_id(&mut self, id: i64) {
        self.values.insert(ID_FIELD.into(), FieldValue::Int(id));
    }

    /// Base-record lifecycle on first persist.
    pub fn pre_persist(&mut self, now: DateTime<Utc>, actor: Option<&str>) {
        self.values.insert(CREATED_ON.into(), FieldValue::Instant(now));
        self.values.insert(UPDATED_ON.into(), FieldValue::Instant(now));
        if let Some(actor) = actor {
            self.values.insert(CREATED_BY.into(), FieldValue::Text(actor.to_string()));
            self.values.insert(UPDATED_BY.into(), FieldValue::Text(actor.to_string()));
        }
    }

    /// Base-record lifecycle on merge.
    pub fn pre_update(&mut self, now: DateTime<Utc>, actor: Option<&str>) {
        self.values.insert(UPDATED_ON.into(), FieldValue::Instant(now));
        if let Some(actor) = actor {
            self.values.insert(UPDATED_BY.into(), FieldValue::Text(actor.to_string()));
        }
    }
}

impl FieldAccessor for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    fn set(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }

    fn field_names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

impl Instance {
    /// The real implementation behind any proxy.
    pub fn unwrap_proxy(&self) -> &Record {
        match self {
            Instance::Loaded(r) => r,
            Instance::Proxy(p) => &p.target,
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            Instance::Loaded(r) => r,
            Instance::Proxy(p) => p.target,
        }
    }
}

impl From<Record> for Instance {
    fn from(record: Record) -> Self {
        Instance::Loaded(record)
    }
}

impl FieldValue {
    pub fn related(record: Record) -> Self {
        FieldValue::Related(Box::new(Instance::Loaded(record)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Full structural JSON form; related records are expanded.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::Number((*n).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Instant(t) => Value::String(format_instant(t)),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            FieldValue::Related(instance) => Value::Object(record_to_json(instance.unwrap_proxy())),
        }
    }
}

pub fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Every stored value of a record, related records expanded.
pub fn record_to_json(record: &Record) -> Map<String, Value> {
    record
        .values()
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

/// Coerce a JSON value into the declared type of a field.
///
/// Numbers widen into any numeric target, strings parse into numeric, boolean and
/// instant targets, objects become related records when the target is a record type.
pub fn coerce(value: &Value, ty: &TypeTag, catalog: &TypeCatalog) -> Result<FieldValue, CoercionError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }
    match catalog.resolve_alias(ty) {
        TypeTag::Boolean => match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(FieldValue::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(FieldValue::Bool(false)),
            other => Err(mismatch("Boolean", other)),
        },
        TypeTag::Integer => integral(value, i32::MIN as i64, i32::MAX as i64, "Integer"),
        TypeTag::Long => integral(value, i64::MIN, i64::MAX, "Long"),
        tag @ (TypeTag::Float | TypeTag::Double) => match value {
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| mismatch(&tag.to_string(), value)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| CoercionError(format!("cannot parse '{}' as {}", s, tag))),
            other => Err(mismatch(&tag.to_string(), other)),
        },
        TypeTag::String => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(mismatch("String", other)),
        },
        TypeTag::Instant => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| FieldValue::Instant(t.with_timezone(&Utc)))
                .map_err(|_| CoercionError(format!("cannot parse '{}' as Instant", s))),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(FieldValue::Instant)
                .ok_or_else(|| mismatch("Instant", value)),
            other => Err(mismatch("Instant", other)),
        },
        TypeTag::Object => Ok(untyped(value)),
        TypeTag::List(elem) | TypeTag::Collection(elem) => match value {
            Value::Array(items) => items
                .iter()
                .map(|v| coerce(v, &elem, catalog))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            other => Err(mismatch("array", other)),
        },
        TypeTag::Set(elem) => match value {
            Value::Array(items) => {
                let mut out: Vec<FieldValue> = Vec::with_capacity(items.len());
                for v in items {
                    let item = coerce(v, &elem, catalog)?;
                    if !out.contains(&item) {
                        out.push(item);
                    }
                }
                Ok(FieldValue::List(out))
            }
            other => Err(mismatch("array", other)),
        },
        TypeTag::Map(key, val) => match value {
            Value::Object(entries) => {
                let mut out = BTreeMap::new();
                for (k, v) in entries {
                    coerce(&Value::String(k.clone()), &key, catalog)?;
                    out.insert(k.clone(), coerce(v, &val, catalog)?);
                }
                Ok(FieldValue::Map(out))
            }
            other => Err(mismatch("object", other)),
        },
        TypeTag::Named(name) => match (catalog.get(&name), value) {
            (Some(record_type), Value::Object(obj)) => {
                record_from_json(obj, record_type, catalog).map(FieldValue::related)
            }
            (Some(_), other) => Err(mismatch(&name, other)),
            (None, other) => Ok(untyped(other)),
        },
    }
}

/// Build a record from a JSON object, every key must be a declared or inherited field.
pub fn record_from_json(
    obj: &Map<String, Value>,
    ty: &RecordType,
    catalog: &TypeCatalog,
) -> Result<Record, CoercionError> {
    let mut record = Record::new(&ty.name);
    for (key, value) in obj {
        let field = catalog
            .field_of(ty, key)
            .ok_or_else(|| CoercionError(format!("unknown field '{}' on {}", key, ty.name)))?;
        let coerced = coerce(value, &field.ty, catalog)
            .map_err(|e| CoercionError(format!("field '{}': {}", key, e.0)))?;
        record.set(key, coerced);
    }
    Ok(record)
}

fn integral(value: &Value, min: i64, max: i64, target: &str) -> Result<FieldValue, CoercionError> {
    let n = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64),
        },
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match n {
        Some(i) if i >= min && i <= max => Ok(FieldValue::Int(i)),
        Some(i) => Err(CoercionError(format!("{} is out of range for {}", i, target))),
        None => Err(mismatch(target, value)),
    }
}

fn untyped(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            None => FieldValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Array(items) => FieldValue::List(items.iter().map(untyped).collect()),
        Value::Object(entries) => {
            FieldValue::Map(entries.iter().map(|(k, v)| (k.clone(), untyped(v))).collect())
        }
    }
}

fn mismatch(expected: &str, got: &Value) -> CoercionError {
    let kind = match got {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    CoercionError(format!("expected {}, got {}", expected, kind))
}
