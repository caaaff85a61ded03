use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::models::User;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// First account holding the given role, if any
    async fn find_by_role(&self, role: Role) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Conflict` when the username is taken or an admin already exists
    async fn insert(&self, user: &User) -> Result<(), DatabaseError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SINGLE_ADMIN_INDEX: &str = "users_single_admin";

const USER_COLUMNS: &str = "id, username, password_hash, role, is_permanent, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_role(&self, role: Role) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY created_at LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, is_permanent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_permanent)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let message = match db_err.constraint() {
                    Some(SINGLE_ADMIN_INDEX) => "Admin already exists",
                    _ => "Username already exists",
                };
                Err(DatabaseError::Conflict(message.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
