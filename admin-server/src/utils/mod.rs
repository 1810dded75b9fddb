//! 工具模块 - 时间、时钟、金额、日志

pub mod clock;
pub mod logger;
pub mod money;
pub mod time;

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
