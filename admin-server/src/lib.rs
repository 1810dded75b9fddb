//! Admin Server - 外卖点餐管理后台核心
//!
//! # 架构概述
//!
//! - **订单生命周期** (`orders`): 超时未支付自动取消、派送超时自动完成
//! - **调度器** (`scheduler`): 按间隔或 cron 触发命名任务，防重入
//! - **统计** (`statistics`): 营业额、用户、订单、销量排行、营业数据报表
//! - **存储** (`store`, `db`): `OrderStore` 接口 + SQLite 实现
//!
//! # 模块结构
//!
//! ```text
//! admin-server/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── db/            # 连接池、迁移、repository
//! ├── store/         # OrderStore 接口
//! ├── orders/        # 生命周期清扫
//! ├── scheduler/     # 定时任务调度
//! ├── statistics/    # 统计引擎
//! └── utils/         # 时间、时钟、金额、日志
//! ```

pub mod core;
pub mod db;
pub mod orders;
pub mod scheduler;
pub mod statistics;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{AdminState, BackgroundTasks, Config};
pub use scheduler::{Job, JobHandle, JobScheduler, JobStats, Schedule};
pub use statistics::StatisticsService;
pub use store::{OrderStore, SqliteOrderStore, TimeWindow, UpdateOutcome};
pub use utils::{AppError, AppResult, Clock, ErrorCategory, ErrorCode, SystemClock};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 初始化日志 (`.env` 由调用方在加载配置前读取)
///
/// 日志级别、格式来自 `LOG_LEVEL` / `LOG_JSON`，生产环境额外写入 `<WORK_DIR>/logs`。
pub fn setup_environment(config: &Config) -> anyhow::Result<()> {
    let log_dir = config.is_production().then(|| config.log_dir());
    init_logger_with_file(&config.log_level, config.log_json, log_dir.as_deref())
}

pub fn print_banner() {
    println!(
        r#"
    ___       __          _
   /   | ____/ /___ ___  (_)___
  / /| |/ __  / __ `__ \/ / __ \
 / ___ / /_/ / / / / / / / / / /
/_/  |_\__,_/_/ /_/ /_/_/_/ /_/
    "#
    );
}
