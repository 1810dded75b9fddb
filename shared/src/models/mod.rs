//! Data models
//!
//! Shared between admin-server and any API layer in front of it.
//! All IDs are `i64`, all timestamps are Unix millis (UTC).

pub mod order;
pub mod report;
pub mod user;

// Re-exports
pub use order::*;
pub use report::*;
pub use user::*;
