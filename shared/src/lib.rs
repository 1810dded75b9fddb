//! Shared types for the ordering admin backend
//!
//! Domain models (orders, users, report DTOs), the audit capability and the
//! unified error type. Used by `admin-server` and by any future API layer.

pub mod audit;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use audit::{AuditOp, Auditable, OperationContext, SYSTEM_ACTOR_ID, audited};
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
