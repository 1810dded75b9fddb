//! 金额计算工具
//!
//! 派生金额 (客单价等) 用 `Decimal` 计算，输出时四舍五入到 2 位再转回 `f64`。

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, half-up to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `total / count`, 0 when count is 0
pub fn per_unit(total: f64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    to_f64(to_decimal(total) / Decimal::from(count))
}
