//! Order store interface
//!
//! The lifecycle sweeps and the statistics engine reach persisted orders only
//! through [`OrderStore`]. [`SqliteOrderStore`] is the shipped implementation.

pub mod sqlite;

pub use sqlite::SqliteOrderStore;
pub use shared::models::UpdateOutcome;

use async_trait::async_trait;
use shared::models::{GoodsSales, Order, OrderStatus, StatusTransition};

use crate::utils::{AppError, AppResult};

/// Half-open timestamp window `[start, end)` in Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> AppResult<Self> {
        if start > end {
            return Err(AppError::invalid_range(start, end));
        }
        Ok(Self { start, end })
    }
}

/// Persistent order/user/order-item store
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders in `status` whose `order_time` is strictly before `before`
    async fn find_by_status_and_time_before(
        &self,
        status: OrderStatus,
        before: i64,
    ) -> AppResult<Vec<Order>>;

    /// Apply `transition` only if the order is still in `expected`
    ///
    /// A terminal `expected` status fails with `OrderTerminal`, an illegal
    /// `expected -> transition.to()` with `InvalidStatusTransition`.
    async fn conditional_update_status(
        &self,
        order_id: i64,
        expected: OrderStatus,
        transition: StatusTransition,
    ) -> AppResult<UpdateOutcome>;

    /// `None` when no order matches
    async fn sum_amount_by_status(
        &self,
        status: OrderStatus,
        window: TimeWindow,
    ) -> AppResult<Option<f64>>;

    async fn count_orders(&self, window: TimeWindow, status: Option<OrderStatus>)
    -> AppResult<i64>;

    /// Users with `create_time` in `[begin, end)`; without `begin`, all users before `end`
    async fn count_users(&self, begin: Option<i64>, end: i64) -> AppResult<i64>;

    /// Summed quantity per goods name over completed orders, quantity desc then name asc
    async fn top_goods_by_quantity(
        &self,
        window: TimeWindow,
        limit: usize,
    ) -> AppResult<Vec<GoodsSales>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(10, 20).unwrap();
        assert_eq!((w.start, w.end), (10, 20));
        assert!(TimeWindow::new(10, 10).is_ok());
        assert_eq!(TimeWindow::new(20, 10).unwrap_err().code, ErrorCode::InvalidDateRange);
    }
}
