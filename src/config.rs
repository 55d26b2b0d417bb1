//! Process-wide configuration, loaded once at startup.

use crate::auth::password;
use anyhow::{Context, Result};
use std::env;

/// Runtime configuration. No `Debug` derive: the signing secret must not
/// be printable.
pub struct Config {
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub auth_db_path: String,
    pub port: u16,
    /// CORS allowed origin; permissive when unset.
    pub client_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        // A missing signing secret is a fatal startup error, never a
        // per-request one.
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        let jwt_ttl_secs = env::var("JWT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(86_400);

        // An unusable work factor should fail startup, not every
        // registration after it.
        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(v) => {
                let cost: u32 = v.parse().context("BCRYPT_COST must be an integer")?;
                anyhow::ensure!(
                    (password::MIN_COST..=password::MAX_COST).contains(&cost),
                    "BCRYPT_COST must be between {} and {}",
                    password::MIN_COST,
                    password::MAX_COST
                );
                cost
            }
            Err(_) => password::DEFAULT_COST,
        };

        let auth_db_path =
            env::var("AUTH_DB_PATH").unwrap_or_else(|_| "./portfolio_auth.db".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .unwrap_or(4000);

        let client_url = env::var("CLIENT_URL").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            jwt_secret,
            jwt_ttl_secs,
            bcrypt_cost,
            auth_db_path,
            port,
            client_url,
        })
    }
}
