//! The `Effect` vocabulary.
//!
//! Every domain crate (`rate-limiter`, `p2p-dissemination`, `mining-driver`,
//! `honeybadger-epoch`) is pure and synchronous: given an input, it returns
//! a `Vec<Effect<T>>` describing what it wants to happen, and never touches
//! the event kernel, a clock, or a socket directly. `sim-runtime` is the
//! only place that interprets effects against the real `event-kernel`.
//! This mirrors the hexagonal split the teacher uses between domain logic
//! and the ports/adapters that perform I/O, specialized here to scheduling
//! instead of network or database access.

use crate::envelope::Envelope;
use crate::gate::GateId;
use crate::time::SimDuration;
use serde::{Deserialize, Serialize};

/// Opaque handle to a scheduled self-timer, returned by the kernel when an
/// effect schedules one and later passed back in a `CancelTimer` effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// An action a domain module asks the runtime to perform. `T` is the
/// module's own timer-tag type (an enum of "what kind of timer is this"),
/// kept generic so each domain crate can define its own timer vocabulary
/// without shared-types knowing about it.
#[derive(Debug, Clone)]
pub enum Effect<T> {
    /// Send `envelope` out through `to_gate`.
    Send { to_gate: GateId, envelope: Envelope },
    /// Schedule `timer` to fire after `delay` of virtual time, returning a
    /// handle the caller can later cancel.
    ScheduleTimer { timer: T, delay: SimDuration },
    /// Cancel a previously scheduled timer. Cancelling a timer that has
    /// already fired is a no-op at the kernel.
    CancelTimer { handle: TimerHandle },
    /// Record one sample into a named histogram for `sim-telemetry`.
    RecordSample { histogram: &'static str, sample: f64 },
}

impl<T> Effect<T> {
    pub fn send(to_gate: GateId, envelope: Envelope) -> Self {
        Effect::Send { to_gate, envelope }
    }

    pub fn schedule(timer: T, delay: SimDuration) -> Self {
        Effect::ScheduleTimer { timer, delay }
    }

    pub fn cancel(handle: TimerHandle) -> Self {
        Effect::CancelTimer { handle }
    }

    pub fn sample(histogram: &'static str, sample: f64) -> Self {
        Effect::RecordSample { histogram, sample }
    }
}
