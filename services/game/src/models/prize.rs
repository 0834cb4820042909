//! Prize catalog model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog entry carrying this name awards nothing: it is never persisted as a
/// win and never claimable.
pub const NO_WIN_NAME: &str = "Try Again";

/// Prize catalog entry
///
/// `probability` is a relative weight, not a normalized percentage; the catalog
/// total may be any positive number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prize {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub text_color: String,
    pub probability: f64,
}

impl Prize {
    /// Whether this entry is the no-win sentinel
    pub fn is_no_win(&self) -> bool {
        self.name == NO_WIN_NAME
    }
}
