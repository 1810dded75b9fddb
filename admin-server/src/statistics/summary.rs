//! 昨日营业数据汇总任务

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::BusinessData;

use super::StatisticsService;
use crate::scheduler::Job;
use crate::utils::AppResult;

pub const BUSINESS_SUMMARY_JOB: &str = "business_summary";

/// Logs the previous business day's snapshot
pub struct BusinessSummaryJob {
    stats: StatisticsService,
}

impl BusinessSummaryJob {
    pub fn new(stats: StatisticsService) -> Self {
        Self { stats }
    }

    /// Previous calendar day in the business timezone
    fn yesterday(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.with_timezone(&self.stats.timezone()).date_naive();
        today.pred_opt().unwrap_or(today)
    }

    pub async fn summarize(&self, now: DateTime<Utc>) -> AppResult<(NaiveDate, BusinessData)> {
        let date = self.yesterday(now);
        let data = self.stats.business_data(date, date).await?;
        Ok((date, data))
    }
}

#[async_trait]
impl Job for BusinessSummaryJob {
    async fn run(&self, now: DateTime<Utc>) -> AppResult<()> {
        let (date, data) = self.summarize(now).await?;
        tracing::info!(
            job = %BUSINESS_SUMMARY_JOB,
            date = %date,
            turnover = data.turnover,
            valid_orders = data.valid_order_count,
            completion_rate = data.order_completion_rate,
            unit_price = data.unit_price,
            new_users = data.new_users,
            "Daily business summary"
        );
        Ok(())
    }
}
