//! Resource CRUD handlers: list, create, read, update, patch, delete over `/api/{resource}`.

use crate::config::HttpVerb;
use crate::error::AppError;
use crate::extractors::CurrentPrincipal;
use crate::model::record::ID_FIELD;
use crate::registry::RegistryEntry;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::dispatcher::not_found;
use crate::service::PageRequest;
use crate::state::AppState;
use crate::synth::controller::MERGE_PATCH_JSON;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Registered entry for `resource`, unless `verb` is disabled on it.
fn resolve<'a>(state: &'a AppState, resource: &str, verb: HttpVerb) -> Result<&'a RegistryEntry, AppError> {
    let entry = state.registry.by_simple_name(resource)?;
    if entry.spec.is_disabled(verb) {
        return Err(AppError::VerbDisabled(verb));
    }
    Ok(entry)
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
}

fn body_to_map(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("malformed JSON body: {}", e))),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Get)?;
    let page = PageRequest::from_query(&params, &entry.spec.pagination)?;
    let rows = if page.limit == 0 {
        Vec::new()
    } else {
        state.dispatcher.find_all(entry, page.offset, page.limit).await?
    };
    Ok(success_many(rows, page.offset, page.limit))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    principal: CurrentPrincipal,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Post)?;
    let body = body_to_map(&body)?;
    let created = state.dispatcher.create(entry, &body, principal.actor()).await?;
    Ok(success_one(created))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Get)?;
    let id = parse_id(&id)?;
    let found = state
        .dispatcher
        .find_by_id(entry, id)
        .await?
        .ok_or_else(|| not_found(entry, id))?;
    Ok(success_one_ok(found))
}

/// Full replacement; the path id wins over any id in the body.
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    principal: CurrentPrincipal,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Put)?;
    let id = parse_id(&id)?;
    let mut body = body_to_map(&body)?;
    body.insert(ID_FIELD.to_string(), Value::from(id));
    let updated = state.dispatcher.update(entry, &body, principal.actor()).await?;
    Ok(success_one_ok(updated))
}

pub async fn patch(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    principal: CurrentPrincipal,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Patch)?;
    let id = parse_id(&id)?;
    check_patch_content_type(&headers)?;
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadMergePatch(format!("malformed merge patch document: {}", e)))?;
    let patched = state.patch.patch(entry, id, &document, principal.actor()).await?;
    Ok(success_one_ok(patched))
}

/// Deleting a missing id still answers 204.
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entry = resolve(&state, &resource, HttpVerb::Delete)?;
    let id = parse_id(&id)?;
    state.dispatcher.delete(entry, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Plain application/json is tolerated next to the merge-patch media type.
fn check_patch_content_type(headers: &HeaderMap) -> Result<(), AppError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    let media = value
        .to_str()
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if media == MERGE_PATCH_JSON || media == "application/json" {
        Ok(())
    } else {
        Err(AppError::BadMergePatch(format!(
            "unsupported content type '{}', expected {}",
            media, MERGE_PATCH_JSON
        )))
    }
}
