//! 核心模块 - 配置、状态与后台任务
//!
//! - [`Config`] - 服务配置
//! - [`AdminState`] - 数据库、存储、统计服务
//! - [`BackgroundTasks`] - 后台任务注册与关闭

pub mod config;
pub mod state;
pub mod tasks;

pub use config::{Config, JobsConfig};
pub use state::AdminState;
pub use tasks::BackgroundTasks;
