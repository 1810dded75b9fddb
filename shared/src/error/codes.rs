//! Unified error codes
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Report errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order already reached a terminal status
    OrderTerminal = 4002,
    /// Order status changed concurrently
    OrderStatusConflict = 4003,
    /// Status transition not allowed
    InvalidStatusTransition = 4004,

    // ==================== 6xxx: Report ====================
    /// Begin date is after end date
    InvalidDateRange = 6001,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Store temporarily unavailable
    StoreUnavailable = 9003,
    /// Configuration error
    ConfigError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderTerminal => "Order is in a terminal status",
            ErrorCode::OrderStatusConflict => "Order status changed concurrently",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",

            // Report
            ErrorCode::InvalidDateRange => "Begin date must not be after end date",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StoreUnavailable => "Order store is unavailable",
            ErrorCode::ConfigError => "Configuration error",
        }
    }

    /// Whether a retry on the next scheduled tick may succeed
    pub const fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::StoreUnavailable | ErrorCode::DatabaseError)
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderTerminal),
            4003 => Ok(ErrorCode::OrderStatusConflict),
            4004 => Ok(ErrorCode::InvalidStatusTransition),

            // Report
            6001 => Ok(ErrorCode::InvalidDateRange),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::StoreUnavailable),
            9004 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderStatusConflict.code(), 4003);
        assert_eq!(ErrorCode::InvalidDateRange.code(), 6001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::StoreUnavailable.code(), 9003);
    }

    #[test]
    fn test_try_from_valid() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderTerminal,
            ErrorCode::OrderStatusConflict,
            ErrorCode::InvalidStatusTransition,
            ErrorCode::InvalidDateRange,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::StoreUnavailable,
            ErrorCode::ConfigError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(ErrorCode::try_from(9005), Err(InvalidErrorCode(9005)));
    }

    #[test]
    fn test_transient_codes() {
        assert!(ErrorCode::StoreUnavailable.is_transient());
        assert!(ErrorCode::DatabaseError.is_transient());
        assert!(!ErrorCode::InvalidDateRange.is_transient());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::InvalidDateRange).unwrap();
        assert_eq!(json, "6001");
        let code: ErrorCode = serde_json::from_str("9003").unwrap();
        assert_eq!(code, ErrorCode::StoreUnavailable);
    }
}
