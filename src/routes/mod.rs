//! Router assembly.

pub mod common;
pub mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::middleware::{authenticate, problem_instance};
use crate::state::AppState;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Full application: common and resource routes behind the body limit and authentication.
/// The security gate sits on the resource routes themselves.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state.clone()))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(problem_instance))
                .layer(middleware::from_fn_with_state(state, authenticate)),
        )
}
