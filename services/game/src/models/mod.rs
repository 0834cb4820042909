//! Game service models

pub mod prize;
pub mod user;
pub mod win;

// Re-export for convenience
pub use prize::{NO_WIN_NAME, Prize};
pub use user::{NewUser, User};
pub use win::WinRecord;
