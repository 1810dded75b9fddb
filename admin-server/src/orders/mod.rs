//! 订单生命周期
//!
//! - [`lifecycle`] - 超时清扫 (未支付自动取消 / 派送超时自动完成)

pub mod lifecycle;

pub use lifecycle::{
    DELIVERY_TIMEOUT_JOB, DeliveryTimeoutJob, PAYMENT_TIMEOUT_JOB, PaymentTimeoutJob, SweepReport,
    sweep_payment_timeouts, sweep_stuck_deliveries,
};
