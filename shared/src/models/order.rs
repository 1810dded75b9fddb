//! Order Model

use serde::{Deserialize, Serialize};

use crate::audit::{AuditOp, Auditable};

/// Cancel reason written by the payment-timeout sweep
pub const PAYMENT_TIMEOUT_REASON: &str = "payment timeout, auto-cancelled";

/// Order status
///
/// The discriminants are the persisted integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 待付款
    PendingPayment = 1,
    /// 待接单
    ToBeConfirmed = 2,
    /// 已接单
    Confirmed = 3,
    /// 派送中
    DeliveryInProgress = 4,
    /// 已完成
    Completed = 5,
    /// 已取消
    Cancelled = 6,
    /// 已退款
    Refunded = 7,
}

impl OrderStatus {
    /// Persisted integer code
    #[inline]
    pub const fn code(&self) -> i64 {
        *self as i64
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::PendingPayment),
            2 => Some(Self::ToBeConfirmed),
            3 => Some(Self::Confirmed),
            4 => Some(Self::DeliveryInProgress),
            5 => Some(Self::Completed),
            6 => Some(Self::Cancelled),
            7 => Some(Self::Refunded),
            _ => None,
        }
    }

    /// Completed, Cancelled and Refunded accept no further mutation
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// Whether `self -> next` is a legal status transition
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, ToBeConfirmed | Cancelled)
                | (ToBeConfirmed, Confirmed | Cancelled | Refunded)
                | (Confirmed, DeliveryInProgress | Cancelled | Refunded)
                | (DeliveryInProgress, Completed | Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::ToBeConfirmed => "TO_BE_CONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::DeliveryInProgress => "DELIVERY_IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        };
        f.write_str(name)
    }
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    /// Total amount in currency unit
    pub amount: f64,
    /// Creation time, immutable
    pub order_time: i64,
    pub pay_time: Option<i64>,
    /// Set iff status is Cancelled
    pub cancel_time: Option<i64>,
    /// Set iff status is Cancelled
    pub cancel_reason: Option<String>,
    pub updated_at: Option<i64>,
    pub updated_by: Option<i64>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub amount: f64,
    pub order_time: i64,
    pub pay_time: Option<i64>,
    pub updated_at: Option<i64>,
    pub updated_by: Option<i64>,
}

impl NewOrder {
    /// A freshly placed order, waiting for payment
    pub fn pending(user_id: i64, amount: f64, order_time: i64) -> Self {
        Self {
            id: crate::util::snowflake_id(),
            user_id,
            status: OrderStatus::PendingPayment,
            amount,
            order_time,
            pay_time: None,
            updated_at: None,
            updated_by: None,
        }
    }

    /// Override the initial status (imports, fixtures)
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

impl Auditable for NewOrder {
    fn set_audit_fields(&mut self, now: i64, actor_id: i64, _op: AuditOp) {
        self.updated_at = Some(now);
        self.updated_by = Some(actor_id);
    }
}

/// Fields written by a conditional status update
///
/// Cancel fields are only reachable through [`StatusTransition::cancel`], so a
/// transition carries them iff its target is `Cancelled`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    to: OrderStatus,
    pay_time: Option<i64>,
    cancel_time: Option<i64>,
    cancel_reason: Option<String>,
    updated_at: Option<i64>,
    updated_by: Option<i64>,
}

impl StatusTransition {
    fn bare(to: OrderStatus) -> Self {
        Self {
            to,
            pay_time: None,
            cancel_time: None,
            cancel_reason: None,
            updated_at: None,
            updated_by: None,
        }
    }

    /// Transition into `Cancelled`
    pub fn cancel(reason: impl Into<String>, cancel_time: i64) -> Self {
        Self {
            cancel_time: Some(cancel_time),
            cancel_reason: Some(reason.into()),
            ..Self::bare(OrderStatus::Cancelled)
        }
    }

    /// Transition into `Completed`
    pub fn complete() -> Self {
        Self::bare(OrderStatus::Completed)
    }

    /// Payment confirmed: `PendingPayment -> ToBeConfirmed`
    pub fn pay(pay_time: i64) -> Self {
        Self {
            pay_time: Some(pay_time),
            ..Self::bare(OrderStatus::ToBeConfirmed)
        }
    }

    /// Any transition that carries no extra fields. `None` for `Cancelled`,
    /// which needs a reason and time.
    pub fn advance(to: OrderStatus) -> Option<Self> {
        match to {
            OrderStatus::Cancelled => None,
            _ => Some(Self::bare(to)),
        }
    }

    pub fn to(&self) -> OrderStatus {
        self.to
    }

    pub fn pay_time(&self) -> Option<i64> {
        self.pay_time
    }

    pub fn cancel_time(&self) -> Option<i64> {
        self.cancel_time
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    pub fn updated_by(&self) -> Option<i64> {
        self.updated_by
    }
}

impl Auditable for StatusTransition {
    fn set_audit_fields(&mut self, now: i64, actor_id: i64, _op: AuditOp) {
        self.updated_at = Some(now);
        self.updated_by = Some(actor_id);
    }
}

/// Outcome of a conditional status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOutcome {
    /// Row matched the expected status and was written
    Applied,
    /// Row exists but its status no longer matches
    Conflict,
    /// No such order
    NotFound,
}

/// Order line (order_detail)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Goods (dish / combo) name
    pub name: String,
    pub quantity: i64,
}

/// Create order item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub name: String,
    pub quantity: i64,
}

/// Summed sales for one goods name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsSales {
    pub name: String,
    pub number: i64,
}
