//! 服务状态 - 数据库、存储、统计服务以及定时任务注册

use std::path::Path;
use std::sync::Arc;

use crate::core::{BackgroundTasks, Config};
use crate::db::DbService;
use crate::orders::{DELIVERY_TIMEOUT_JOB, DeliveryTimeoutJob, PAYMENT_TIMEOUT_JOB, PaymentTimeoutJob};
use crate::scheduler::{JobHandle, JobScheduler};
use crate::statistics::{BUSINESS_SUMMARY_JOB, BusinessSummaryJob, StatisticsService};
use crate::store::{OrderStore, SqliteOrderStore};
use crate::utils::{AppError, AppResult, Clock};

/// 服务状态
///
/// 所有字段都是廉价 clone (连接池 / Arc)。
#[derive(Clone)]
pub struct AdminState {
    pub config: Config,
    pub store: SqliteOrderStore,
    pub statistics: StatisticsService,
}

impl AdminState {
    /// 打开数据库 (不存在则创建并迁移)，组装服务
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        if let Some(parent) = Path::new(&config.database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    pub fn with_db(config: Config, db: DbService) -> Self {
        let store = SqliteOrderStore::new(db);
        let statistics = StatisticsService::new(Arc::new(store.clone()), config.timezone);
        Self {
            config,
            store,
            statistics,
        }
    }

    pub fn order_store(&self) -> Arc<dyn OrderStore> {
        Arc::new(self.store.clone())
    }

    /// 注册所有定时任务并启动
    pub fn start_jobs(&self, clock: Arc<dyn Clock>, tasks: &mut BackgroundTasks) -> Vec<JobHandle> {
        let jobs = &self.config.jobs;
        let mut scheduler = JobScheduler::new(clock, self.config.timezone);
        let mut handles = vec![
            scheduler.register(
                PAYMENT_TIMEOUT_JOB,
                jobs.payment_sweep.clone(),
                Arc::new(PaymentTimeoutJob::new(self.order_store(), jobs.payment_timeout)),
            ),
            scheduler.register(
                DELIVERY_TIMEOUT_JOB,
                jobs.delivery_sweep.clone(),
                Arc::new(DeliveryTimeoutJob::new(self.order_store(), jobs.delivery_timeout)),
            ),
        ];
        if jobs.enable_business_summary {
            handles.push(scheduler.register(
                BUSINESS_SUMMARY_JOB,
                jobs.business_summary.clone(),
                Arc::new(BusinessSummaryJob::new(self.statistics.clone())),
            ));
        }

        scheduler.start(tasks);
        handles
    }
}
