//! User Model

use serde::{Deserialize, Serialize};

/// User entity (only the fields the statistics engine reads)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Registration time (Unix millis), immutable
    pub create_time: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: i64,
    pub create_time: i64,
}

impl NewUser {
    pub fn new(create_time: i64) -> Self {
        Self {
            id: crate::util::snowflake_id(),
            create_time,
        }
    }
}
