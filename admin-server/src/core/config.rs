use chrono_tz::Tz;

use crate::scheduler::Schedule;
use crate::utils::{AppError, AppResult, time};

/// 服务配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (数据库、日志) |
/// | DATABASE_PATH | `<WORK_DIR>/admin.db` | SQLite 文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 日志 |
/// | TIMEZONE | Asia/Shanghai | 业务时区 |
/// | PAYMENT_SWEEP_SCHEDULE | @every 60s | 超时未支付清扫 |
/// | PAYMENT_TIMEOUT_MINUTES | 15 | 未支付超时阈值 |
/// | DELIVERY_SWEEP_SCHEDULE | 0 0 1 * * * | 派送超时清扫 |
/// | DELIVERY_TIMEOUT_MINUTES | 60 | 派送超时阈值 |
/// | BUSINESS_SUMMARY_SCHEDULE | 0 5 1 * * * | 昨日营业数据汇总 |
/// | ENABLE_BUSINESS_SUMMARY | true | 是否启用汇总任务 |
///
/// # 示例
///
/// ```ignore
/// TIMEZONE=Europe/Madrid PAYMENT_SWEEP_SCHEDULE="@every 30s" cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub database_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 业务时区 (日期分桶、cron)
    pub timezone: Tz,
    pub jobs: JobsConfig,
}

/// 定时任务配置
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub payment_sweep: Schedule,
    pub payment_timeout: chrono::Duration,
    pub delivery_sweep: Schedule,
    pub delivery_timeout: chrono::Duration,
    pub business_summary: Schedule,
    pub enable_business_summary: bool,
}

const DEFAULT_PAYMENT_SWEEP: &str = "@every 60s";
const DEFAULT_DELIVERY_SWEEP: &str = "0 0 1 * * *";
const DEFAULT_BUSINESS_SUMMARY: &str = "0 5 1 * * *";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::validation(format!("Invalid value for {}: {}", key, raw)).with_detail("key", key)
        }),
        Err(_) => Ok(default),
    }
}

fn env_schedule(key: &str, default: &str) -> AppResult<Schedule> {
    Schedule::parse(&env_or(key, default)).map_err(|e| e.with_detail("key", key))
}

fn env_minutes(key: &str, default: i64) -> AppResult<chrono::Duration> {
    let minutes: i64 = env_parse(key, default)?;
    if minutes <= 0 {
        return Err(AppError::validation(format!("{} must be positive, got {}", key, minutes)));
    }
    chrono::Duration::try_minutes(minutes).ok_or_else(|| {
        AppError::validation(format!("{} is out of range: {}", key, minutes)).with_detail("key", key)
    })
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；无法解析的时区、调度表达式或数字返回校验错误。
    pub fn from_env() -> AppResult<Self> {
        let work_dir = env_or("WORK_DIR", "./work_dir");
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| format!("{}/admin.db", work_dir));

        Ok(Self {
            database_path,
            environment: env_or("ENVIRONMENT", "development"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_json: env_parse("LOG_JSON", false)?,
            timezone: time::parse_timezone(&env_or("TIMEZONE", "Asia/Shanghai"))?,
            jobs: JobsConfig {
                payment_sweep: env_schedule("PAYMENT_SWEEP_SCHEDULE", DEFAULT_PAYMENT_SWEEP)?,
                payment_timeout: env_minutes("PAYMENT_TIMEOUT_MINUTES", 15)?,
                delivery_sweep: env_schedule("DELIVERY_SWEEP_SCHEDULE", DEFAULT_DELIVERY_SWEEP)?,
                delivery_timeout: env_minutes("DELIVERY_TIMEOUT_MINUTES", 60)?,
                business_summary: env_schedule("BUSINESS_SUMMARY_SCHEDULE", DEFAULT_BUSINESS_SUMMARY)?,
                enable_business_summary: env_parse("ENABLE_BUSINESS_SUMMARY", true)?,
            },
            work_dir,
        })
    }

    /// 日志目录
    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.work_dir)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
