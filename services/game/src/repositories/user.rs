//! User profile repository
//!
//! Holds the read-through projection of identities owned by the provider. The
//! row is keyed by the provider-issued id and never updated by this service.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

/// User profile repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the profile row for a freshly registered identity
    pub async fn create(&self, new_user: &NewUser) -> Result<User, sqlx::Error> {
        info!("Creating profile for {}", new_user.email);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, first_name, last_name, created_at
            "#,
        )
        .bind(new_user.id)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a profile by the provider-issued id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
