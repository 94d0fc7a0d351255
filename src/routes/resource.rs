//! Generic resource routes. One parameterized route pair serves every registered resource;
//! handlers resolve the entry by the path segment.

use crate::handlers::resource::{create, delete as delete_handler, list, patch, read, update};
use crate::middleware::enforce_security;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/:resource", get(list).post(create))
        .route(
            "/api/:resource/:id",
            get(read).put(update).patch(patch).delete(delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), enforce_security))
        .with_state(state)
}
