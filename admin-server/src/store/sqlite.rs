//! SQLite-backed [`OrderStore`]

use async_trait::async_trait;
use shared::models::{
    GoodsSales, NewOrder, NewOrderItem, NewUser, Order, OrderStatus, StatusTransition,
    UpdateOutcome,
};

use super::{OrderStore, TimeWindow};
use crate::db::DbService;
use crate::db::repository::{order, user};
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct SqliteOrderStore {
    db: DbService,
}

impl SqliteOrderStore {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DbService {
        &self.db
    }

    pub async fn insert_order(&self, data: &NewOrder) -> AppResult<()> {
        order::insert(&self.db.pool, data).await?;
        Ok(())
    }

    pub async fn insert_order_item(&self, data: &NewOrderItem) -> AppResult<i64> {
        Ok(order::insert_item(&self.db.pool, data).await?)
    }

    pub async fn insert_user(&self, data: &NewUser) -> AppResult<()> {
        user::insert(&self.db.pool, data).await?;
        Ok(())
    }

    pub async fn find_order(&self, id: i64) -> AppResult<Option<Order>> {
        Ok(order::find_by_id(&self.db.pool, id).await?)
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn find_by_status_and_time_before(
        &self,
        status: OrderStatus,
        before: i64,
    ) -> AppResult<Vec<Order>> {
        Ok(order::find_by_status_before(&self.db.pool, status, before).await?)
    }

    async fn conditional_update_status(
        &self,
        order_id: i64,
        expected: OrderStatus,
        transition: StatusTransition,
    ) -> AppResult<UpdateOutcome> {
        if expected.is_terminal() {
            return Err(AppError::with_message(
                ErrorCode::OrderTerminal,
                format!("Order {} expected status {} is terminal", order_id, expected),
            )
            .with_detail("order_id", order_id));
        }
        if !expected.can_transition_to(transition.to()) {
            return Err(AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Illegal transition {} -> {}", expected, transition.to()),
            )
            .with_detail("order_id", order_id));
        }

        let pool = &self.db.pool;
        if order::update_status_if(pool, order_id, expected, &transition).await? == 1 {
            return Ok(UpdateOutcome::Applied);
        }
        if order::exists(pool, order_id).await? {
            Ok(UpdateOutcome::Conflict)
        } else {
            Ok(UpdateOutcome::NotFound)
        }
    }

    async fn sum_amount_by_status(
        &self,
        status: OrderStatus,
        window: TimeWindow,
    ) -> AppResult<Option<f64>> {
        Ok(order::sum_amount(&self.db.pool, status, window.start, window.end).await?)
    }

    async fn count_orders(
        &self,
        window: TimeWindow,
        status: Option<OrderStatus>,
    ) -> AppResult<i64> {
        Ok(order::count(&self.db.pool, window.start, window.end, status).await?)
    }

    async fn count_users(&self, begin: Option<i64>, end: i64) -> AppResult<i64> {
        Ok(user::count(&self.db.pool, begin, end).await?)
    }

    async fn top_goods_by_quantity(
        &self,
        window: TimeWindow,
        limit: usize,
    ) -> AppResult<Vec<GoodsSales>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(order::top_goods(&self.db.pool, window.start, window.end, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteOrderStore {
        SqliteOrderStore::new(DbService::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_conditional_update_outcomes() {
        let store = store().await;
        let order = NewOrder::pending(1, 30.0, 0);
        store.insert_order(&order).await.unwrap();

        let outcome = store
            .conditional_update_status(order.id, OrderStatus::PendingPayment, StatusTransition::pay(10))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);

        let outcome = store
            .conditional_update_status(
                order.id,
                OrderStatus::PendingPayment,
                StatusTransition::cancel("payment timeout, auto-cancelled", 20),
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Conflict);

        let outcome = store
            .conditional_update_status(order.id + 1, OrderStatus::PendingPayment, StatusTransition::pay(10))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::ToBeConfirmed);
        assert_eq!(stored.cancel_reason, None);
    }

    #[tokio::test]
    async fn test_terminal_expected_status_is_rejected() {
        let store = store().await;
        let order = NewOrder::pending(1, 30.0, 0).with_status(OrderStatus::Completed);
        store.insert_order(&order).await.unwrap();

        let err = store
            .conditional_update_status(order.id, OrderStatus::Completed, StatusTransition::complete())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderTerminal);
        assert_eq!(err.code.category(), shared::ErrorCategory::Order);

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected() {
        let store = store().await;
        let order = NewOrder::pending(1, 30.0, 0);
        store.insert_order(&order).await.unwrap();

        let err = store
            .conditional_update_status(order.id, OrderStatus::PendingPayment, StatusTransition::complete())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let store = store().await;
        store.db().pool.close().await;

        let err = store.count_users(None, 1000).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
        assert!(err.is_transient());
    }
}
