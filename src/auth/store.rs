//! User Record Store
//! Mission: One store abstraction, one SQLite backing implementation

use crate::auth::errors::StoreError;
use crate::auth::models::{NewUser, Role, User, UserPatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::info;
use uuid::Uuid;

/// Persistence interface consumed by the auth flows and middleware.
///
/// Flows receive this as `Arc<dyn UserStore>`, constructed once at startup.
/// Email uniqueness is enforced here (unique constraint), not by the
/// check-then-create sequence in registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;
}

/// SQLite-backed user store.
pub struct SqliteUserStore {
    db_path: String,
}

impl SqliteUserStore {
    /// Open the store and make sure the schema exists.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        info!("user store ready at {}", db_path);
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;

        // COLLATE NOCASE on the unique column makes email uniqueness
        // case-insensitive at the database level.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL COLLATE NOCASE UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create users table")?;

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open auth database")
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.connect().map_err(StoreError::Backend)?;

        let mut stmt = conn.prepare(
            "SELECT id, name, email, password_hash, role, created_at, updated_at
             FROM users WHERE email = ?1",
        )?;

        match stmt.query_row(params![email], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.connect().map_err(StoreError::Backend)?;

        let mut stmt = conn.prepare(
            "SELECT id, name, email, password_hash, role, created_at, updated_at
             FROM users WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };

        let conn = self.connect().map_err(StoreError::Backend)?;
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;

        info!("created user {} ({})", user.email, user.role.as_str());
        Ok(user)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let conn = self.connect().map_err(StoreError::Backend)?;

        // Typed patch, fixed column list. `updated_at` always moves forward
        // on any mutation.
        let affected = conn.execute(
            "UPDATE users SET
                name = COALESCE(?2, name),
                email = COALESCE(?3, email),
                password_hash = COALESCE(?4, password_hash),
                role = COALESCE(?5, role),
                updated_at = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                patch.name,
                patch.email,
                patch.password_hash,
                patch.role.map(|r| r.as_str()),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let role_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(User {
        id: Uuid::parse_str(&id_str).map_err(|e| text_conversion_error(0, e))?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role_str).unwrap_or(Role::User),
        created_at: parse_timestamp(5, &created_str)?,
        updated_at: parse_timestamp(6, &updated_str)?,
    })
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| text_conversion_error(idx, e))
}

fn text_conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}
