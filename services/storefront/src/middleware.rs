//! Authentication middleware for JWT token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Caller identity derived from a validated token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

/// Extract and validate the JWT from the Authorization header
///
/// A missing or non-Bearer header means the caller never authenticated; a
/// present token that fails signature or expiry checks means the caller
/// must re-authenticate. Both end the request before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    // Validate the token
    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|_| ApiError::InvalidCredential)?;

    // Insert the caller identity into the request extensions
    let user = AuthUser {
        id: claims.sub,
        email: claims.email,
        username: claims.username,
    };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
