//! Repositories for database operations

pub mod prize;
pub mod user;
pub mod win;

// Re-export for convenience
pub use prize::PrizeRepository;
pub use user::UserRepository;
pub use win::{LedgerError, WinRepository};
