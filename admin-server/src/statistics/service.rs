//! Statistics engine
//!
//! Read-only and stateless between calls. Every method takes an inclusive
//! calendar date range `[begin, end]` in the business timezone; day `d` covers
//! `[00:00 of d, 00:00 of d+1)`. `begin > end` is rejected before any query.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{
    BusinessData, BusinessReport, DailyBusinessData, OrderReport, OrderStatus, SalesTop10Report,
    TurnoverReport, UserReport,
};
use tracing::instrument;

use crate::store::{OrderStore, TimeWindow};
use crate::utils::{AppResult, money, time};

/// Entries in the top sellers ranking
pub const SALES_TOP_LIMIT: usize = 10;

/// Days covered by the exported business report
const REPORT_DAYS: u64 = 30;

/// valid / total, 0 when total is 0
fn completion_rate(valid: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        valid as f64 / total as f64
    }
}

#[derive(Clone)]
pub struct StatisticsService {
    store: Arc<dyn OrderStore>,
    tz: Tz,
}

impl StatisticsService {
    pub fn new(store: Arc<dyn OrderStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    fn day_window(&self, date: NaiveDate) -> AppResult<TimeWindow> {
        self.range_window(date, date)
    }

    fn range_window(&self, begin: NaiveDate, end: NaiveDate) -> AppResult<TimeWindow> {
        TimeWindow::new(
            time::day_start_millis(begin, self.tz),
            time::day_end_millis(end, self.tz),
        )
    }

    async fn turnover_in(&self, window: TimeWindow) -> AppResult<f64> {
        let sum = self
            .store
            .sum_amount_by_status(OrderStatus::Completed, window)
            .await?;
        Ok(sum.unwrap_or(0.0))
    }

    /// Completed-order turnover per day
    #[instrument(skip(self))]
    pub async fn turnover_statistics(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<TurnoverReport> {
        let date_list = time::date_range(begin, end)?;
        let mut turnover_list = Vec::with_capacity(date_list.len());
        for date in &date_list {
            turnover_list.push(self.turnover_in(self.day_window(*date)?).await?);
        }
        Ok(TurnoverReport {
            date_list,
            turnover_list,
        })
    }

    /// Cumulative and new users per day
    #[instrument(skip(self))]
    pub async fn user_statistics(&self, begin: NaiveDate, end: NaiveDate) -> AppResult<UserReport> {
        let date_list = time::date_range(begin, end)?;
        let mut total_user_list = Vec::with_capacity(date_list.len());
        let mut new_user_list = Vec::with_capacity(date_list.len());
        for date in &date_list {
            let window = self.day_window(*date)?;
            total_user_list.push(self.store.count_users(None, window.end).await?);
            new_user_list.push(self.store.count_users(Some(window.start), window.end).await?);
        }
        Ok(UserReport {
            date_list,
            total_user_list,
            new_user_list,
        })
    }

    /// All / completed orders per day, with range totals and completion rate
    #[instrument(skip(self))]
    pub async fn order_statistics(&self, begin: NaiveDate, end: NaiveDate) -> AppResult<OrderReport> {
        let date_list = time::date_range(begin, end)?;
        let mut order_count_list = Vec::with_capacity(date_list.len());
        let mut valid_order_count_list = Vec::with_capacity(date_list.len());
        for date in &date_list {
            let window = self.day_window(*date)?;
            order_count_list.push(self.store.count_orders(window, None).await?);
            valid_order_count_list.push(
                self.store
                    .count_orders(window, Some(OrderStatus::Completed))
                    .await?,
            );
        }

        let total_order_count: i64 = order_count_list.iter().sum();
        let valid_order_count: i64 = valid_order_count_list.iter().sum();
        Ok(OrderReport {
            date_list,
            order_count_list,
            valid_order_count_list,
            total_order_count,
            valid_order_count,
            order_completion_rate: completion_rate(valid_order_count, total_order_count),
        })
    }

    /// Best-selling goods over completed orders in the range
    #[instrument(skip(self))]
    pub async fn sales_top10(&self, begin: NaiveDate, end: NaiveDate) -> AppResult<SalesTop10Report> {
        time::date_range(begin, end)?;
        let window = self.range_window(begin, end)?;
        let goods = self
            .store
            .top_goods_by_quantity(window, SALES_TOP_LIMIT)
            .await?;

        let (name_list, number_list) = goods
            .into_iter()
            .take(SALES_TOP_LIMIT)
            .map(|g| (g.name, g.number))
            .unzip();
        Ok(SalesTop10Report {
            name_list,
            number_list,
        })
    }

    /// Business snapshot for one window (single day when `begin == end`)
    #[instrument(skip(self))]
    pub async fn business_data(&self, begin: NaiveDate, end: NaiveDate) -> AppResult<BusinessData> {
        time::date_range(begin, end)?;
        self.business_data_in(self.range_window(begin, end)?).await
    }

    async fn business_data_in(&self, window: TimeWindow) -> AppResult<BusinessData> {
        let turnover = self.turnover_in(window).await?;
        let valid_order_count = self
            .store
            .count_orders(window, Some(OrderStatus::Completed))
            .await?;
        let total_order_count = self.store.count_orders(window, None).await?;
        let new_users = self.store.count_users(Some(window.start), window.end).await?;

        Ok(BusinessData {
            turnover,
            valid_order_count,
            order_completion_rate: completion_rate(valid_order_count, total_order_count),
            unit_price: money::per_unit(turnover, valid_order_count),
            new_users,
        })
    }

    /// Export data set: the 30 days before `today`, overview plus daily rows
    #[instrument(skip(self))]
    pub async fn business_report(&self, today: NaiveDate) -> AppResult<BusinessReport> {
        let begin = today - chrono::Days::new(REPORT_DAYS);
        let end = today - chrono::Days::new(1);

        let overview = self.business_data(begin, end).await?;
        let mut days = Vec::with_capacity(REPORT_DAYS as usize);
        for date in time::date_range(begin, end)? {
            let data = self.business_data_in(self.day_window(date)?).await?;
            days.push(DailyBusinessData { date, data });
        }

        Ok(BusinessReport {
            begin,
            end,
            overview,
            days,
        })
    }
}
