//! Registration & Login Flows
//! Mission: Orchestrate validation, hashing, store lookups and token issuance

use crate::auth::errors::ApiError;
use crate::auth::middleware::CurrentUser;
use crate::auth::models::{
    is_valid_email, LoginRequest, NewUser, RegisterRequest, Role, TokenResponse, User, UserData,
    UserPatch,
};
use crate::auth::{password, AuthState};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A known-good bcrypt digest (of an unrelated string). Verified against
/// when login hits an unknown email so that the response takes the same
/// time as a real password check.
const DUMMY_DIGEST: &str = "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// POST /api/auth/register
///
/// The public endpoint never accepts a role; every registration is a plain
/// `user`. Elevation happens only through privileged in-process calls.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }

    let email = normalize_email(&payload.email)?;
    password::validate_password(&payload.password)?;

    // Friendly duplicate check first; the store's unique constraint is the
    // real arbiter if two registrations race past this point.
    if state.store.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict);
    }

    let password_hash = password::hash_password(payload.password, state.bcrypt_cost).await?;

    let user = state
        .store
        .create(NewUser {
            name,
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = issue_token(&state, &user)?;

    info!("registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce byte-identical responses.
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let user = match state.store.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            // Burn the same verification work as the found path so the
            // two failures are not distinguishable by timing either.
            let _ = password::verify_password(payload.password, DUMMY_DIGEST.to_string()).await;
            warn!("login failed for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let matches =
        password::verify_password(payload.password, user.password_hash.clone()).await?;
    if !matches {
        warn!("login failed for user {}", user.id);
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&state, &user)?;

    info!("login successful for user {}", user.id);
    Ok(Json(TokenResponse {
        success: true,
        token,
    }))
}

/// GET /api/auth/me
///
/// Reads the record the middleware resolved from the store, never the
/// token claims.
pub async fn me(
    current: Option<Extension<CurrentUser>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Extension(CurrentUser(user)) = current.ok_or(ApiError::Unauthenticated)?;

    Ok(Json(json!({
        "success": true,
        "data": UserData::from_user(&user),
    })))
}

/// Settable fields for an account update, from the caller's perspective.
/// The plaintext password is replaced by its hash before the store is
/// involved; there is no hidden on-save hook.
#[derive(Debug, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Apply an account update for privileged in-process callers.
///
/// Returns `None` when the account does not exist.
pub async fn apply_account_update(
    state: &AuthState,
    id: Uuid,
    update: AccountUpdate,
) -> Result<Option<User>, ApiError> {
    let name = match update.name {
        Some(n) => {
            let n = n.trim().to_string();
            if n.is_empty() {
                return Err(ApiError::Validation("Name is required".to_string()));
            }
            Some(n)
        }
        None => None,
    };

    let email = match update.email {
        Some(e) => Some(normalize_email(&e)?),
        None => None,
    };

    // The update touches the password: validate and re-hash it here,
    // explicitly, before persisting.
    let password_hash = match update.password {
        Some(plaintext) => Some(password::hash_password(plaintext, state.bcrypt_cost).await?),
        None => None,
    };

    let patch = UserPatch {
        name,
        email,
        password_hash,
        role: None,
    };

    Ok(state.store.update(id, patch).await?)
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation(
            "Please include a valid email".to_string(),
        ));
    }
    Ok(email)
}

fn issue_token(state: &AuthState, user: &User) -> Result<String, ApiError> {
    state.jwt.issue(user.id, user.role).map_err(|e| {
        error!("token issuance failed: {:#}", e);
        ApiError::Internal
    })
}
