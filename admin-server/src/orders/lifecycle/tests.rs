use super::*;
use crate::db::DbService;
use crate::store::{SqliteOrderStore, TimeWindow};
use crate::utils::{Clock, ManualClock};
use chrono::TimeZone;
use shared::error::{AppError, ErrorCode};
use shared::models::{GoodsSales, NewOrder, Order};

const PAYMENT_THRESHOLD: i64 = 15;
const DELIVERY_THRESHOLD: i64 = 60;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn minutes_ago(m: i64) -> i64 {
    (now() - chrono::Duration::minutes(m)).timestamp_millis()
}

fn payment_threshold() -> chrono::Duration {
    chrono::Duration::minutes(PAYMENT_THRESHOLD)
}

fn delivery_threshold() -> chrono::Duration {
    chrono::Duration::minutes(DELIVERY_THRESHOLD)
}

async fn store() -> SqliteOrderStore {
    SqliteOrderStore::new(DbService::in_memory().await.unwrap())
}

async fn seed(store: &SqliteOrderStore, status: OrderStatus, order_time: i64) -> i64 {
    let order = NewOrder::pending(1, 20.0, order_time).with_status(status);
    store.insert_order(&order).await.unwrap();
    order.id
}

async fn status_of(store: &SqliteOrderStore, id: i64) -> OrderStatus {
    store.find_order(id).await.unwrap().unwrap().status
}

/// Fault-injecting wrapper around the real store
#[derive(Default)]
struct Faults {
    fail_select: bool,
    fail_update_for: Option<i64>,
    /// Pay this order right before the sweep's update reaches it
    pay_first: Option<i64>,
    /// Extra order id returned by selection that does not exist
    phantom: Option<i64>,
}

struct FlakyStore {
    inner: SqliteOrderStore,
    faults: Faults,
}

#[async_trait]
impl OrderStore for FlakyStore {
    async fn find_by_status_and_time_before(
        &self,
        status: OrderStatus,
        before: i64,
    ) -> AppResult<Vec<Order>> {
        if self.faults.fail_select {
            return Err(AppError::store_unavailable("pool timed out"));
        }
        let mut orders = self.inner.find_by_status_and_time_before(status, before).await?;
        if let Some(id) = self.faults.phantom {
            let mut ghost = orders[0].clone();
            ghost.id = id;
            orders.push(ghost);
        }
        Ok(orders)
    }

    async fn conditional_update_status(
        &self,
        order_id: i64,
        expected: OrderStatus,
        transition: StatusTransition,
    ) -> AppResult<UpdateOutcome> {
        if self.faults.fail_update_for == Some(order_id) {
            return Err(AppError::database("disk I/O error"));
        }
        if self.faults.pay_first == Some(order_id) {
            self.inner
                .conditional_update_status(order_id, OrderStatus::PendingPayment, StatusTransition::pay(1))
                .await?;
        }
        self.inner
            .conditional_update_status(order_id, expected, transition)
            .await
    }

    async fn sum_amount_by_status(
        &self,
        status: OrderStatus,
        window: TimeWindow,
    ) -> AppResult<Option<f64>> {
        self.inner.sum_amount_by_status(status, window).await
    }

    async fn count_orders(
        &self,
        window: TimeWindow,
        status: Option<OrderStatus>,
    ) -> AppResult<i64> {
        self.inner.count_orders(window, status).await
    }

    async fn count_users(&self, begin: Option<i64>, end: i64) -> AppResult<i64> {
        self.inner.count_users(begin, end).await
    }

    async fn top_goods_by_quantity(
        &self,
        window: TimeWindow,
        limit: usize,
    ) -> AppResult<Vec<GoodsSales>> {
        self.inner.top_goods_by_quantity(window, limit).await
    }
}

#[tokio::test]
async fn test_stale_unpaid_order_is_cancelled_fresh_one_untouched() {
    let store = store().await;
    let a = seed(&store, OrderStatus::PendingPayment, minutes_ago(20)).await;
    let b = seed(&store, OrderStatus::PendingPayment, minutes_ago(5)).await;

    let report = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 1, applied: 1, ..Default::default() });

    let cancelled = store.find_order(a).await.unwrap().unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.cancel_time, Some(now().timestamp_millis()));
    assert_eq!(cancelled.cancel_reason.as_deref(), Some(PAYMENT_TIMEOUT_REASON));
    assert_eq!(cancelled.updated_at, Some(now().timestamp_millis()));
    assert_eq!(cancelled.updated_by, Some(shared::SYSTEM_ACTOR_ID));

    let untouched = store.find_order(b).await.unwrap().unwrap();
    assert_eq!(untouched.status, OrderStatus::PendingPayment);
    assert_eq!(untouched.cancel_time, None);
}

#[tokio::test]
async fn test_payment_sweep_is_idempotent() {
    let store = store().await;
    seed(&store, OrderStatus::PendingPayment, minutes_ago(30)).await;
    seed(&store, OrderStatus::PendingPayment, minutes_ago(40)).await;

    let ctx = OperationContext::system();
    let first = sweep_payment_timeouts(&store, now(), payment_threshold(), &ctx).await.unwrap();
    assert_eq!(first.applied, 2);

    let second = sweep_payment_timeouts(&store, now(), payment_threshold(), &ctx).await.unwrap();
    assert_eq!(second, SweepReport::default());
}

#[tokio::test]
async fn test_order_exactly_at_threshold_is_not_selected() {
    let store = store().await;
    let edge = seed(&store, OrderStatus::PendingPayment, minutes_ago(PAYMENT_THRESHOLD)).await;
    let past = seed(&store, OrderStatus::PendingPayment, minutes_ago(PAYMENT_THRESHOLD) - 1).await;

    let report = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(status_of(&store, edge).await, OrderStatus::PendingPayment);
    assert_eq!(status_of(&store, past).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_concurrent_payment_wins_over_sweep() {
    let inner = store().await;
    let id = seed(&inner, OrderStatus::PendingPayment, minutes_ago(20)).await;
    let store = FlakyStore {
        inner: inner.clone(),
        faults: Faults {
            pay_first: Some(id),
            ..Default::default()
        },
    };

    let report = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 1, conflicts: 1, ..Default::default() });

    let order = inner.find_order(id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::ToBeConfirmed);
    assert_eq!(order.cancel_time, None);
    assert_eq!(order.cancel_reason, None);
}

#[tokio::test]
async fn test_one_failed_update_does_not_abort_batch() {
    let inner = store().await;
    let first = seed(&inner, OrderStatus::PendingPayment, minutes_ago(50)).await;
    let broken = seed(&inner, OrderStatus::PendingPayment, minutes_ago(40)).await;
    let last = seed(&inner, OrderStatus::PendingPayment, minutes_ago(30)).await;
    let store = FlakyStore {
        inner: inner.clone(),
        faults: Faults {
            fail_update_for: Some(broken),
            ..Default::default()
        },
    };

    let report = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 3, applied: 2, failed: 1, ..Default::default() });
    assert_eq!(status_of(&inner, first).await, OrderStatus::Cancelled);
    assert_eq!(status_of(&inner, broken).await, OrderStatus::PendingPayment);
    assert_eq!(status_of(&inner, last).await, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_vanished_order_counts_as_missing() {
    let inner = store().await;
    seed(&inner, OrderStatus::PendingPayment, minutes_ago(20)).await;
    let store = FlakyStore {
        inner,
        faults: Faults {
            phantom: Some(-1),
            ..Default::default()
        },
    };

    let report = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 2, applied: 1, missing: 1, ..Default::default() });
}

#[tokio::test]
async fn test_selection_failure_is_the_job_error() {
    let store = FlakyStore {
        inner: store().await,
        faults: Faults {
            fail_select: true,
            ..Default::default()
        },
    };

    let err = sweep_payment_timeouts(&store, now(), payment_threshold(), &OperationContext::system())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StoreUnavailable);

    let job = PaymentTimeoutJob::new(Arc::new(store), payment_threshold());
    assert!(job.run(now()).await.is_err());
}

#[tokio::test]
async fn test_stuck_delivery_is_completed() {
    let store = store().await;
    let stuck = seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(61)).await;
    let recent = seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(30)).await;
    let confirmed = seed(&store, OrderStatus::Confirmed, minutes_ago(120)).await;

    let report = sweep_stuck_deliveries(&store, now(), delivery_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 1, applied: 1, ..Default::default() });

    let completed = store.find_order(stuck).await.unwrap().unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(completed.cancel_time, None);
    assert_eq!(status_of(&store, recent).await, OrderStatus::DeliveryInProgress);
    assert_eq!(status_of(&store, confirmed).await, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_jobs_run_as_system_actor() {
    let store = store().await;
    let unpaid = seed(&store, OrderStatus::PendingPayment, minutes_ago(20)).await;
    let delivering = seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(90)).await;
    let shared_store: Arc<dyn OrderStore> = Arc::new(store.clone());

    PaymentTimeoutJob::new(shared_store.clone(), payment_threshold())
        .run(now())
        .await
        .unwrap();
    DeliveryTimeoutJob::new(shared_store, delivery_threshold())
        .run(now())
        .await
        .unwrap();

    for id in [unpaid, delivering] {
        let order = store.find_order(id).await.unwrap().unwrap();
        assert!(order.status.is_terminal());
        assert_eq!(order.updated_by, Some(shared::SYSTEM_ACTOR_ID));
    }
}

#[tokio::test]
async fn test_delivery_exactly_at_threshold_is_not_selected() {
    let store = store().await;
    let edge = seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(DELIVERY_THRESHOLD)).await;
    let past = seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(DELIVERY_THRESHOLD) - 1).await;

    let report = sweep_stuck_deliveries(&store, now(), delivery_threshold(), &OperationContext::system())
        .await
        .unwrap();
    assert_eq!(report, SweepReport { matched: 1, applied: 1, ..Default::default() });
    assert_eq!(status_of(&store, edge).await, OrderStatus::DeliveryInProgress);
    assert_eq!(status_of(&store, past).await, OrderStatus::Completed);
}

#[tokio::test]
async fn test_delivery_sweep_is_idempotent() {
    let store = store().await;
    seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(90)).await;
    seed(&store, OrderStatus::DeliveryInProgress, minutes_ago(120)).await;

    let ctx = OperationContext::system();
    let first = sweep_stuck_deliveries(&store, now(), delivery_threshold(), &ctx).await.unwrap();
    assert_eq!(first.applied, 2);

    let second = sweep_stuck_deliveries(&store, now(), delivery_threshold(), &ctx).await.unwrap();
    assert_eq!(second, SweepReport::default());
}

#[tokio::test]
async fn test_payment_job_follows_the_clock() {
    let store = store().await;
    let clock = ManualClock::new(now());
    let id = seed(&store, OrderStatus::PendingPayment, clock.now_millis()).await;
    let job = PaymentTimeoutJob::new(Arc::new(store.clone()), payment_threshold());

    clock.advance(chrono::Duration::minutes(5));
    job.run(clock.now()).await.unwrap();
    assert_eq!(status_of(&store, id).await, OrderStatus::PendingPayment);

    clock.advance(chrono::Duration::minutes(PAYMENT_THRESHOLD));
    job.run(clock.now()).await.unwrap();
    let order = store.find_order(id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.cancel_time, Some(clock.now_millis()));
}
