//! Audit capability (公共字段填充)
//!
//! Entities that carry audit columns implement [`Auditable`]. Writers stamp
//! them explicitly through [`audited`] before handing them to the store; there
//! is no ambient "current user" state.

/// Actor id used by background jobs (sweeps, summaries)
pub const SYSTEM_ACTOR_ID: i64 = 0;

/// Kind of store mutation being audited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOp {
    Insert,
    Update,
}

/// Entity with audit fields
pub trait Auditable {
    /// Stamp audit fields. `Insert` also sets creation fields where present.
    fn set_audit_fields(&mut self, now: i64, actor_id: i64, op: AuditOp);
}

/// Explicit operation context, passed to every operation that needs an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationContext {
    pub actor_id: i64,
}

impl OperationContext {
    pub fn new(actor_id: i64) -> Self {
        Self { actor_id }
    }

    /// Context for scheduled/background work
    pub fn system() -> Self {
        Self::new(SYSTEM_ACTOR_ID)
    }

    pub fn is_system(&self) -> bool {
        self.actor_id == SYSTEM_ACTOR_ID
    }
}

/// Stamp `entity` for `op` on behalf of `ctx`
pub fn audited<T: Auditable>(mut entity: T, ctx: &OperationContext, now: i64, op: AuditOp) -> T {
    entity.set_audit_fields(now, ctx.actor_id, op);
    tracing::trace!(actor_id = ctx.actor_id, op = ?op, "Audit fields applied");
    entity
}
