//! Extract the authenticated principal placed on the request by the authentication layer.

use crate::security::Principal;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Optional caller; `None` for anonymous requests.
#[derive(Clone, Debug, Default)]
pub struct CurrentPrincipal(pub Option<Principal>);

impl CurrentPrincipal {
    /// Name recorded in audit fields.
    pub fn actor(&self) -> Option<&str> {
        self.0.as_ref().map(|p| p.name.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
