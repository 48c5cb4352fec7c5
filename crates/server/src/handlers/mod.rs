//! HTTP request handlers organized by domain

pub mod auth;
pub mod expenses;
pub mod health;
pub mod receipts;
pub mod user;

// Re-export all handlers for use in router
pub use auth::*;
pub use expenses::*;
pub use health::*;
pub use receipts::*;
pub use user::*;
