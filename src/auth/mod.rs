//! Authentication Module
//! Mission: Stateless JWT authentication with per-request store re-resolution

pub mod errors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod store;

pub use errors::ApiError;
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, require_roles, CurrentUser, RequiredRoles, ADMIN_ONLY};
pub use models::{Role, User};
pub use store::{SqliteUserStore, UserStore};

use std::sync::Arc;

/// Shared auth state: the store handle and the token handler, constructed
/// once at startup and injected into flows and middleware.
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn UserStore>,
    pub jwt: Arc<JwtHandler>,
    pub bcrypt_cost: u32,
}

impl AuthState {
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtHandler>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }
}
