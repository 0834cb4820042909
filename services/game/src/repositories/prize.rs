//! Prize catalog repository
//!
//! The catalog is read-only for the game: no create, update, or delete surface
//! is exposed. Rows are seeded by migration.

use sqlx::PgPool;

use crate::models::Prize;

/// Read-only prize catalog
#[derive(Clone)]
pub struct PrizeRepository {
    pool: PgPool,
}

impl PrizeRepository {
    /// Create a new prize repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List the catalog in stable id order, reading the store at call time
    pub async fn list(&self) -> Result<Vec<Prize>, sqlx::Error> {
        sqlx::query_as::<_, Prize>(
            r#"
            SELECT id, name, color, text_color, probability
            FROM prizes
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
