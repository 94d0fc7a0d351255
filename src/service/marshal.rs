//! Record <-> API map conversion, written against [`FieldAccessor`].

use crate::error::AppError;
use crate::model::record::{is_internal_name, ID_FIELD};
use crate::model::value::coerce;
use crate::model::{FieldAccessor, FieldDecl, FieldValue, Record, RecordType, TypeCatalog, TypeTag};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Suffix of the key a related record is reduced to.
pub const RELATED_ID_SUFFIX: &str = "Id";

static NULL: FieldValue = FieldValue::Null;

/// How a declared field appears in the API map.
enum Shape<'a> {
    Scalar,
    /// Single related record of the named type.
    Related(&'a RecordType),
    /// Collection of related records, summarized by count.
    RelatedMany,
}

fn shape<'a>(decl: &FieldDecl, catalog: &'a TypeCatalog) -> Shape<'a> {
    match catalog.resolve_alias(&decl.ty) {
        TypeTag::List(t) | TypeTag::Set(t) | TypeTag::Collection(t) if catalog.record_of(&t).is_some() => {
            Shape::RelatedMany
        }
        TypeTag::Named(_) => match catalog.record_of(&decl.ty) {
            Some(target) => Shape::Related(target),
            None => Shape::Scalar,
        },
        _ => Shape::Scalar,
    }
}

fn exposed(decl: &FieldDecl, ignored: &BTreeSet<String>) -> bool {
    !decl.is_static && !is_internal_name(&decl.name) && !ignored.contains(&decl.name)
}

/// API map of a record: related records become `<field>Id`, related collections a `{"count": n}` summary.
pub fn to_map<A: FieldAccessor + ?Sized>(
    accessor: &A,
    ty: &RecordType,
    catalog: &TypeCatalog,
    ignored: &BTreeSet<String>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for decl in catalog.all_fields(ty) {
        if !exposed(decl, ignored) {
            continue;
        }
        let value = accessor.get(&decl.name).unwrap_or(&NULL);
        match shape(decl, catalog) {
            Shape::Scalar => {
                out.insert(decl.name.clone(), value.to_json());
            }
            Shape::Related(_) => match value {
                FieldValue::Related(instance) => {
                    if let Some(id) = instance.unwrap_proxy().id() {
                        out.insert(related_key(&decl.name), Value::from(id));
                    }
                }
                _ => {
                    out.insert(related_key(&decl.name), Value::Null);
                }
            },
            Shape::RelatedMany => {
                let count = match value {
                    FieldValue::List(items) => items.len(),
                    FieldValue::Map(entries) => entries.len(),
                    _ => 0,
                };
                out.insert(decl.name.clone(), serde_json::json!({ "count": count }));
            }
        }
    }
    out
}

/// Build a record of `ty` from an API map. Unknown, ignored or read-only keys are rejected,
/// except related collections, which are summaries and skipped.
pub fn from_map(
    map: &Map<String, Value>,
    ty: &RecordType,
    catalog: &TypeCatalog,
    ignored: &BTreeSet<String>,
) -> Result<Record, AppError> {
    let mut record = Record::new(&ty.name);
    for (key, value) in map {
        if let Some(decl) = catalog.field_of(ty, key) {
            if !exposed(decl, ignored) {
                return Err(AppError::BadRequest(format!("field '{}' is not writable", key)));
            }
            match shape(decl, catalog) {
                Shape::RelatedMany => continue,
                Shape::Scalar | Shape::Related(_) => {
                    let coerced = coerce(value, &decl.ty, catalog)
                        .map_err(|e| AppError::BadRequest(format!("field '{}': {}", key, e)))?;
                    record.set(key, coerced);
                }
            }
            continue;
        }

        let related = key
            .strip_suffix(RELATED_ID_SUFFIX)
            .and_then(|stem| catalog.field_of(ty, stem))
            .filter(|decl| exposed(decl, ignored))
            .and_then(|decl| match shape(decl, catalog) {
                Shape::Related(target) => Some((decl, target)),
                _ => None,
            });
        let Some((decl, target)) = related else {
            return Err(AppError::BadRequest(format!("unknown field '{}' on {}", key, ty.name)));
        };
        let reference = match value {
            Value::Null => FieldValue::Null,
            other => match coerce(other, &TypeTag::Long, catalog) {
                Ok(FieldValue::Int(id)) => FieldValue::related(Record::reference(&target.name, id)),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "field '{}': expected an id of {}",
                        key, target.name
                    )))
                }
            },
        };
        record.set(&decl.name, reference);
    }
    Ok(record)
}

fn related_key(field: &str) -> String {
    format!("{}{}", field, RELATED_ID_SUFFIX)
}

/// Id carried by an API map, as a number or numeric string.
pub fn id_of(map: &Map<String, Value>) -> Option<i64> {
    match map.get(ID_FIELD)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use crate::model::{FieldDecl, Instance, LazyProxy};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn catalog() -> TypeCatalog {
        let mut order = RecordType::resource("Order", "shop", ResourceConfig::default())
            .with_field("total", TypeTag::Double)
            .with_field("quantity", TypeTag::Integer)
            .with_field("customer", TypeTag::named("Customer"))
            .with_field("lines", TypeTag::named("OrderLines"))
            .with_field("tags", "Set<String>".parse().unwrap())
            .with_field("secret", TypeTag::String)
            .with_field("_persistence_state", TypeTag::Object);
        order.fields.push(FieldDecl {
            name: "SEQ".into(),
            ty: TypeTag::Long,
            is_static: true,
        });
        let customer = RecordType::resource("Customer", "shop", ResourceConfig::default())
            .with_field("name", TypeTag::String);
        let line = RecordType::new("OrderLine", "shop").with_field("sku", TypeTag::String);
        let mut aliases = BTreeMap::new();
        aliases.insert("OrderLines".into(), TypeTag::list_of(TypeTag::named("OrderLine")));
        TypeCatalog::new(vec![order, customer, line], aliases).unwrap()
    }

    fn ignored() -> BTreeSet<String> {
        ["secret".to_string()].into()
    }

    #[test]
    fn to_map_reduces_relations_and_skips_internal_fields() {
        let catalog = catalog();
        let order = catalog.get("Order").unwrap();
        let customer = Record::reference("Customer", 9).with("name", FieldValue::Text("Ada".into()));
        let proxied = FieldValue::Related(Box::new(Instance::Proxy(LazyProxy {
            handler: "Customer$Proxy".into(),
            target: customer,
        })));
        let record = Record::reference("Order", 1)
            .with("total", FieldValue::Float(12.5))
            .with("customer", proxied)
            .with(
                "lines",
                FieldValue::List(vec![
                    FieldValue::related(Record::new("OrderLine")),
                    FieldValue::related(Record::new("OrderLine")),
                ]),
            )
            .with("tags", FieldValue::List(vec![FieldValue::Text("gift".into())]))
            .with("secret", FieldValue::Text("x".into()))
            .with("_persistence_state", FieldValue::Text("dirty".into()));

        let map = to_map(&record, order, &catalog, &ignored());
        assert_eq!(map["id"], json!(1));
        assert_eq!(map["customerId"], json!(9));
        assert_eq!(map["lines"], json!({ "count": 2 }));
        assert_eq!(map["tags"], json!(["gift"]));
        assert_eq!(map["quantity"], Value::Null);
        for hidden in ["secret", "_persistence_state", "SEQ", "customer"] {
            assert!(!map.contains_key(hidden), "{}", hidden);
        }
    }

    #[test]
    fn related_without_id_is_omitted() {
        let catalog = catalog();
        let record = Record::new("Order").with("customer", FieldValue::related(Record::new("Customer")));
        let map = to_map(&record, catalog.get("Order").unwrap(), &catalog, &BTreeSet::new());
        assert!(!map.contains_key("customerId"));
    }

    #[test]
    fn from_map_coerces_and_resolves_references() {
        let catalog = catalog();
        let order = catalog.get("Order").unwrap();
        let body = json!({
            "total": 3,
            "quantity": "4",
            "customerId": 9,
            "lines": { "count": 2 },
            "createdBy": "ada"
        });
        let record = from_map(body.as_object().unwrap(), order, &catalog, &ignored()).unwrap();
        assert_eq!(record.get("total"), Some(&FieldValue::Float(3.0)));
        assert_eq!(record.get("quantity"), Some(&FieldValue::Int(4)));
        assert_eq!(
            record.get("customer"),
            Some(&FieldValue::related(Record::reference("Customer", 9)))
        );
        assert!(record.get("lines").is_none());
        assert_eq!(record.get("createdBy"), Some(&FieldValue::Text("ada".into())));
    }

    #[test]
    fn from_map_rejects_unknown_ignored_and_out_of_range() {
        let catalog = catalog();
        let order = catalog.get("Order").unwrap();
        for body in [
            json!({ "nope": 1 }),
            json!({ "secret": "x" }),
            json!({ "SEQ": 1 }),
            json!({ "quantity": 3_000_000_000i64 }),
            json!({ "totalId": 1 }),
            json!({ "customerId": "abc" }),
        ] {
            let err = from_map(body.as_object().unwrap(), order, &catalog, &ignored()).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{}", body);
        }
    }

    #[test]
    fn id_of_accepts_numbers_and_numeric_strings() {
        assert_eq!(id_of(json!({ "id": 4 }).as_object().unwrap()), Some(4));
        assert_eq!(id_of(json!({ "id": "5" }).as_object().unwrap()), Some(5));
        assert_eq!(id_of(json!({ "id": true }).as_object().unwrap()), None);
        assert_eq!(id_of(json!({}).as_object().unwrap()), None);
    }
}
