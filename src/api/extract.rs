//! Request extractors

use super::response::ApiError;
use super::routes::ApiState;
use crate::error::ServiceError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Uid of the principal making the request, read from the configured header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<ApiState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let header = state.principal_header.as_str();
        let uid = parts
            .headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ServiceError::InvalidArgument(format!("{} header is required", header))
            })?;

        Ok(Principal(uid.to_string()))
    }
}
