//! Statistics report DTOs
//!
//! Series are positionally aligned with `date_list`. Serialized in camelCase
//! so a report exporter or API layer can hand them out unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily turnover series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverReport {
    pub date_list: Vec<NaiveDate>,
    pub turnover_list: Vec<f64>,
}

/// Daily user growth series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
    pub date_list: Vec<NaiveDate>,
    /// Cumulative users at end of day
    pub total_user_list: Vec<i64>,
    pub new_user_list: Vec<i64>,
}

/// Daily order volume series with range totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReport {
    pub date_list: Vec<NaiveDate>,
    pub order_count_list: Vec<i64>,
    pub valid_order_count_list: Vec<i64>,
    pub total_order_count: i64,
    pub valid_order_count: i64,
    /// valid / total, 0 when total is 0
    pub order_completion_rate: f64,
}

/// Top sellers over a range (at most 10 entries)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTop10Report {
    pub name_list: Vec<String>,
    pub number_list: Vec<i64>,
}

/// Business snapshot for one window (one day or a range)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessData {
    pub turnover: f64,
    pub valid_order_count: i64,
    pub order_completion_rate: f64,
    /// turnover / valid_order_count, half-up to 2 decimals, 0 when no valid order
    pub unit_price: f64,
    pub new_users: i64,
}

/// One row of the export sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBusinessData {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub data: BusinessData,
}

/// Export data set: 30-day overview plus one row per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReport {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub overview: BusinessData,
    /// Ascending by date
    pub days: Vec<DailyBusinessData>,
}
