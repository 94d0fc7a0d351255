//! Typed errors and HTTP mapping.

use crate::config::HttpVerb;
use crate::response::{Problem, PROBLEM_CONTENT_TYPE};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Challenge sent with every 401.
pub const WWW_AUTHENTICATE: &str = "Bearer realm=\"resource-sdk\"";

/// Generation and startup errors. Collected per type during synthesis, fatal at registry init.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{type_name} must extend {base} directly")]
    Inheritance { type_name: String, base: String },
    #[error("invalid mapping path '{path}' on {type_name}: segment '{segment}' {reason}")]
    InvalidMappingPath {
        type_name: String,
        path: String,
        segment: String,
        reason: String,
    },
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),
    #[error("missing reference: {kind} id '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("unsupported schema version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("config load: {0}")]
    Load(String),
}

/// Failures reported by a repository adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("unknown record type: {0}")]
    UnknownType(String),
    #[error("record has no id")]
    MissingId,
    #[error("storage: {0}")]
    Storage(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0} method is disabled for this resource")]
    VerbDisabled(HttpVerb),
    #[error("authentication required")]
    Unauthorized,
    #[error("access denied")]
    Forbidden,
    #[error("{0}")]
    BadMergePatch(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::VerbDisabled(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadMergePatch(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Repository(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Problem-details body for this error; `instance` is filled in by the middleware.
    pub fn problem(&self) -> Problem {
        let status = self.status();
        let title = match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Resource Not Found",
            _ => "Unexpected Error",
        };
        let detail = match self {
            AppError::Unexpected(msg) if msg.trim().is_empty() => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        };
        Problem::new(status, title, detail)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let problem = self.problem();
        let mut res = (status, Json(problem.clone())).into_response();
        res.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE));
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(WWW_AUTHENTICATE));
        }
        res.extensions_mut().insert(problem);
        res
    }
}
