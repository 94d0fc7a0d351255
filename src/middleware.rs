//! Request middleware: bearer authentication, the per-resource security gate and problem instances.

use crate::error::AppError;
use crate::response::Problem;
use crate::security::Principal;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

const BEARER: &str = "Bearer ";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve a bearer token to a [`Principal`] request extension. Unknown tokens stay anonymous.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let principal: Option<Principal> = match bearer_token(req.headers()) {
        Some(token) => {
            let found = state.tokens.get(token).cloned();
            if found.is_none() {
                tracing::warn!(path = %req.uri().path(), "unknown bearer token");
            }
            found
        }
        None => None,
    };
    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}

/// Authorization before any handler or data access. Installed as a route layer on the
/// resource routes so it sees the matched, percent-decoded `resource` parameter.
pub async fn enforce_security(
    State(state): State<AppState>,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
    req: Request,
    next: Next,
) -> Response {
    let params = match params {
        Ok(Path(params)) => params,
        Err(rejection) => return AppError::BadRequest(rejection.body_text()).into_response(),
    };
    let Some(resource) = params.get("resource") else {
        return next.run(req).await;
    };
    let verdict = state
        .security
        .evaluate(req.method(), resource, req.extensions().get::<Principal>());
    match verdict {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

/// Rewrite problem bodies with `instance` set to the request path.
pub async fn problem_instance(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;
    let Some(problem) = res.extensions_mut().remove::<Problem>() else {
        return res;
    };
    let body = match serde_json::to_vec(&problem.with_instance(path)) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "problem body serialization failed");
            return res;
        }
    };
    let (mut parts, _) = res.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc "));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
