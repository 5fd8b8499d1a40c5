//! Request authentication middleware
//!
//! - User routes: authentication happens upstream; the auth layer forwards
//!   the verified user in the `X-User-Id` header. [`user_identity_middleware`]
//!   only lifts it into a request extension so handlers can take
//!   `Extension<AuthenticatedUser>`.
//! - Provider callbacks and internal routes: the caller presents the shared
//!   service secret in `X-Service-Secret`, checked by
//!   [`service_auth_middleware`]. An unconfigured secret rejects every call.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::warn;

use super::state::AppState;
use super::types::ApiError;
use crate::core_types::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SERVICE_SECRET_HEADER: &str = "x-service-secret";

/// Caller identity injected by [`user_identity_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

pub async fn user_identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthenticated("Missing X-User-Id header"))?
        .to_string();

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

pub async fn service_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(SERVICE_SECRET_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthenticated("Missing X-Service-Secret header"))?;

    if state.service_secret.is_empty() {
        warn!(path = %request.uri().path(), "service secret not configured, rejecting");
        return Err(ApiError::auth_failed("Service authentication is not configured"));
    }
    if !constant_time_eq(presented.as_bytes(), state.service_secret.as_bytes()) {
        warn!(path = %request.uri().path(), "invalid service secret");
        return Err(ApiError::auth_failed("Invalid service secret"));
    }

    Ok(next.run(request).await)
}

/// Byte comparison whose running time does not depend on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
        assert!(!constant_time_eq(b"s3cret", b"s3cret-longer"));
        assert!(constant_time_eq(b"", b""));
    }
}
