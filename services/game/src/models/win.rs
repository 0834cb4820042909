//! Win record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted win, created exactly once per winning spin
///
/// `prize_name` is denormalized at creation time so history survives later
/// catalog changes. `code` is immutable; `claimed` transitions false to true
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WinRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prize_id: i64,
    pub prize_name: String,
    pub code: String,
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
}
