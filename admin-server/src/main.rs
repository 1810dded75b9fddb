use std::sync::Arc;

use admin_server::{AdminState, BackgroundTasks, Config, SystemClock, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 与配置 (非法时区 / 调度表达式在这里报错)
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 2. 日志
    setup_environment(&config)?;
    print_banner();
    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        "Admin server starting..."
    );

    // 3. 数据库与服务
    let state = AdminState::initialize(&config).await?;

    // 4. 定时任务
    let mut tasks = BackgroundTasks::new();
    let handles = state.start_jobs(Arc::new(SystemClock), &mut tasks);
    tasks.log_summary();

    // 5. 等待退出信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    tasks.shutdown().await;
    for handle in handles {
        let stats = handle.stats();
        tracing::info!(
            job = %handle.name(),
            runs = stats.runs,
            skipped = stats.skipped,
            failures = stats.failures,
            "Job stats at shutdown"
        );
    }

    Ok(())
}
