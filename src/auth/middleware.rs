//! Authentication Middleware & Authorization Gate
//! Mission: Resolve bearer tokens to live user records, gate routes by role

use crate::auth::errors::ApiError;
use crate::auth::models::{Role, User};
use crate::auth::AuthState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// The identity resolved for the current request, attached to request
/// extensions by `auth_middleware` and dropped when handling ends.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticate a request before it reaches a protected handler.
///
/// The subject is re-fetched from the store on every request rather than
/// trusted from the claims, so a role change or account deletion after
/// issuance takes effect immediately. Missing, expired and invalid tokens
/// all fail the same way.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .jwt
        .verify(token)
        .map_err(|_| ApiError::Unauthenticated)?;

    let subject = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthenticated)?;

    let user = state
        .store
        .find_by_id(subject)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Role set a route declares. `&'static` because allowed-role sets are
/// fixed at router construction.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [Role]);

pub const ADMIN_ONLY: RequiredRoles = RequiredRoles(&[Role::Admin]);

/// The authorization predicate: allow only if a resolved identity exists
/// and its role is in the allowed set. No implicit superuser bypass.
pub fn authorize(user: Option<&User>, allowed: &[Role]) -> Result<(), ApiError> {
    // No identity means the auth middleware never ran or failed; fail
    // closed as unauthenticated rather than forbidden.
    let user = user.ok_or(ApiError::Unauthenticated)?;

    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Route layer enforcing `authorize` after `auth_middleware` has run.
pub async fn require_roles(
    State(allowed): State<RequiredRoles>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = req.extensions().get::<CurrentUser>().map(|c| &c.0);
    authorize(user, allowed.0)?;
    Ok(next.run(req).await)
}
