//! 营业统计
//!
//! - [`StatisticsService`] - 按业务时区日期分桶的营业额 / 用户 / 订单 / 销量排行
//! - [`BusinessSummaryJob`] - 每日汇总昨日营业数据 (只读，写日志)

pub mod service;
pub mod summary;

pub use service::{SALES_TOP_LIMIT, StatisticsService};
pub use summary::{BUSINESS_SUMMARY_JOB, BusinessSummaryJob};
