//! 订单超时清扫
//!
//! 两个互相独立的清扫，都只通过 [`OrderStore`] 的条件更新写入：
//!
//! | 清扫 | 选择条件 | 目标状态 |
//! |------|----------|----------|
//! | payment timeout | `PendingPayment` 且 `order_time < now - 15min` | `Cancelled` |
//! | stuck delivery | `DeliveryInProgress` 且 `order_time < now - 60min` | `Completed` |
//!
//! 条件更新以 "当前状态仍是预期状态" 为前提，和支付回调、后厨流程并发时
//! 不会覆盖对方的结果；单个订单失败只记日志，不中断整批。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{OrderStatus, PAYMENT_TIMEOUT_REASON, StatusTransition, UpdateOutcome};
use shared::{AuditOp, OperationContext, audited};

use crate::scheduler::Job;
use crate::store::OrderStore;
use crate::utils::AppResult;

pub const PAYMENT_TIMEOUT_JOB: &str = "payment_timeout_sweep";
pub const DELIVERY_TIMEOUT_JOB: &str = "delivery_timeout_sweep";

/// Outcome counters of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Orders returned by the selection query
    pub matched: usize,
    pub applied: usize,
    /// Status changed underneath us (e.g. paid meanwhile)
    pub conflicts: usize,
    /// Order disappeared between select and update
    pub missing: usize,
    /// Update returned an error
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: AppResult<UpdateOutcome>) {
        match outcome {
            Ok(UpdateOutcome::Applied) => self.applied += 1,
            Ok(UpdateOutcome::Conflict) => self.conflicts += 1,
            Ok(UpdateOutcome::NotFound) => self.missing += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Which stale state to sweep and what it turns into
#[derive(Debug, Clone, Copy)]
enum Sweep {
    PaymentTimeout,
    StuckDelivery,
}

impl Sweep {
    fn name(self) -> &'static str {
        match self {
            Sweep::PaymentTimeout => PAYMENT_TIMEOUT_JOB,
            Sweep::StuckDelivery => DELIVERY_TIMEOUT_JOB,
        }
    }

    fn from_status(self) -> OrderStatus {
        match self {
            Sweep::PaymentTimeout => OrderStatus::PendingPayment,
            Sweep::StuckDelivery => OrderStatus::DeliveryInProgress,
        }
    }

    fn transition(self, now_millis: i64) -> StatusTransition {
        match self {
            Sweep::PaymentTimeout => StatusTransition::cancel(PAYMENT_TIMEOUT_REASON, now_millis),
            Sweep::StuckDelivery => StatusTransition::complete(),
        }
    }
}

async fn run_sweep(
    sweep: Sweep,
    store: &dyn OrderStore,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
    ctx: &OperationContext,
) -> AppResult<SweepReport> {
    let now_millis = now.timestamp_millis();
    let before = now_millis - threshold.num_milliseconds();
    let expected = sweep.from_status();

    // 选择失败直接返回，由调度器在下一个 tick 重试
    let stale = store.find_by_status_and_time_before(expected, before).await?;

    let mut report = SweepReport {
        matched: stale.len(),
        ..Default::default()
    };

    for order in stale {
        let transition = audited(sweep.transition(now_millis), ctx, now_millis, AuditOp::Update);
        let outcome = store
            .conditional_update_status(order.id, expected, transition)
            .await;

        match &outcome {
            Ok(UpdateOutcome::Applied) => {
                tracing::debug!(job = %sweep.name(), order_id = order.id, "Order transitioned");
            }
            Ok(UpdateOutcome::Conflict) => {
                tracing::debug!(job = %sweep.name(), order_id = order.id, "Order status changed concurrently, skipped");
            }
            Ok(UpdateOutcome::NotFound) => {
                tracing::warn!(job = %sweep.name(), order_id = order.id, "Order vanished before update, skipped");
            }
            Err(e) => {
                tracing::error!(job = %sweep.name(), order_id = order.id, error = %e, "Failed to transition order");
            }
        }
        report.record(outcome);
    }

    if report.matched > 0 {
        tracing::info!(
            job = %sweep.name(),
            matched = report.matched,
            applied = report.applied,
            conflicts = report.conflicts,
            missing = report.missing,
            failed = report.failed,
            "Sweep finished"
        );
    } else {
        tracing::debug!(job = %sweep.name(), "Sweep found nothing to do");
    }

    Ok(report)
}

/// Cancel orders left unpaid for longer than `threshold`
///
/// Cancel time is `now`, reason is [`PAYMENT_TIMEOUT_REASON`].
pub async fn sweep_payment_timeouts(
    store: &dyn OrderStore,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
    ctx: &OperationContext,
) -> AppResult<SweepReport> {
    run_sweep(Sweep::PaymentTimeout, store, now, threshold, ctx).await
}

/// Complete orders stuck in delivery for longer than `threshold`
///
/// Staleness is judged on `order_time`, not on when delivery started.
pub async fn sweep_stuck_deliveries(
    store: &dyn OrderStore,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
    ctx: &OperationContext,
) -> AppResult<SweepReport> {
    run_sweep(Sweep::StuckDelivery, store, now, threshold, ctx).await
}

/// Scheduled payment-timeout sweep
pub struct PaymentTimeoutJob {
    store: Arc<dyn OrderStore>,
    threshold: chrono::Duration,
}

impl PaymentTimeoutJob {
    pub fn new(store: Arc<dyn OrderStore>, threshold: chrono::Duration) -> Self {
        Self { store, threshold }
    }
}

#[async_trait]
impl Job for PaymentTimeoutJob {
    async fn run(&self, now: DateTime<Utc>) -> AppResult<()> {
        sweep_payment_timeouts(self.store.as_ref(), now, self.threshold, &OperationContext::system())
            .await
            .map(|_| ())
    }
}

/// Scheduled stuck-delivery sweep
pub struct DeliveryTimeoutJob {
    store: Arc<dyn OrderStore>,
    threshold: chrono::Duration,
}

impl DeliveryTimeoutJob {
    pub fn new(store: Arc<dyn OrderStore>, threshold: chrono::Duration) -> Self {
        Self { store, threshold }
    }
}

#[async_trait]
impl Job for DeliveryTimeoutJob {
    async fn run(&self, now: DateTime<Utc>) -> AppResult<()> {
        sweep_stuck_deliveries(self.store.as_ref(), now, self.threshold, &OperationContext::system())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests;
