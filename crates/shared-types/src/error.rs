//! Shared error taxonomy. Each crate defines its own `thiserror` enum for
//! its local failure modes; `SimError` is the cross-crate shape that
//! `sim-runtime` collapses everything into at the top level.

use thiserror::Error;

/// Top-level error taxonomy, matching the failure classes named in the
/// error-handling design: a fatal invariant violation aborts the run; the
/// others are recoverable conditions a caller may choose to log and
/// continue past.
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// A structural invariant was violated (e.g. block state regressed, a
    /// gate routing rule was broken, a cancelled timer was rescheduled
    /// while still live). Fatal: the run aborts.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A gate address referenced a node, vector, or index that does not
    /// exist in the constructed topology.
    #[error("unknown gate: {0:?}")]
    UnknownGate(String),

    /// A timer handle was cancelled or rescheduled after it already fired.
    #[error("stale timer handle: {0:?}")]
    StaleTimerHandle(u64),

    /// A message arrived at a gate direction that the routing rules forbid
    /// (e.g. an Outer-bound envelope arriving on an Inner gate).
    #[error("routing violation: {0}")]
    RoutingViolation(String),
}
