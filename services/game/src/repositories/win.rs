//! Win ledger repository
//!
//! Records winning spins exactly once, lists a user's history, and flips
//! `claimed` exactly once per row. The data store is the sole consistency
//! arbiter; two concurrent spins may each record a win and that is accepted.

use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NO_WIN_NAME, WinRecord};

/// Redemption code prefix
const CODE_PREFIX: &str = "WIN";
/// Insert attempts before giving up on a unique redemption code
const CODE_ATTEMPTS: u32 = 5;

/// Win ledger failures
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The no-win sentinel must never reach the ledger
    #[error("the no-win outcome is never recorded")]
    NoWinOutcome,

    /// Every generated code collided with an existing row
    #[error("could not allocate a unique redemption code")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Generate a redemption code: fixed prefix plus four zero-padded digits
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{CODE_PREFIX}{:04}", rng.gen_range(0..10_000))
}

/// Win ledger
#[derive(Clone)]
pub struct WinRepository {
    pool: PgPool,
}

impl WinRepository {
    /// Create a new win repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a winning spin as an unclaimed win with a fresh redemption code.
    ///
    /// `user_prizes.code` is UNIQUE; a collision gets a fresh code and another
    /// attempt, bounded by [`CODE_ATTEMPTS`].
    pub async fn record_win(
        &self,
        user_id: Uuid,
        prize_id: i64,
        prize_name: &str,
    ) -> Result<WinRecord, LedgerError> {
        if prize_name == NO_WIN_NAME {
            return Err(LedgerError::NoWinOutcome);
        }

        info!("Recording win of {prize_name} for user {user_id}");

        for attempt in 0..CODE_ATTEMPTS {
            let code = generate_code(&mut rand::thread_rng());

            let inserted = sqlx::query_as::<_, WinRecord>(
                r#"
                INSERT INTO user_prizes (user_id, prize_id, prize_name, code, claimed)
                VALUES ($1, $2, $3, $4, false)
                RETURNING id, user_id, prize_id, prize_name, code, claimed, created_at
                "#,
            )
            .bind(user_id)
            .bind(prize_id)
            .bind(prize_name)
            .bind(&code)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(win) => return Ok(win),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    warn!("Redemption code collision on attempt {attempt}, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(LedgerError::CodeSpaceExhausted)
    }

    /// List a user's wins, newest first
    pub async fn list_wins(&self, user_id: Uuid) -> Result<Vec<WinRecord>, sqlx::Error> {
        sqlx::query_as::<_, WinRecord>(
            r#"
            SELECT id, user_id, prize_id, prize_name, code, claimed, created_at
            FROM user_prizes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a win claimed, scoped to its owner.
    ///
    /// Returns whether a row matched. Claiming an already-claimed win is a
    /// harmless no-op update that still reports success.
    pub async fn claim(&self, win_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_prizes
            SET claimed = true
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(win_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
