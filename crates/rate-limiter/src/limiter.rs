//! The two-FIFO rate shaper, grounded on the original `NodeRateLimiter`
//! module: one queue per direction, each drained by a self-rescheduling
//! timer that fires `bit_length / rate` seconds after the item at the
//! front became eligible to send.

use crate::config::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Effect, Envelope, GateId, GateVector, SimDuration, SimError};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// This node's own timer vocabulary: one self-event per direction,
/// rescheduled for as long as that direction's queue is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    ServiceIncoming,
    ServiceOutgoing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Queued {
    envelope: Envelope,
    dest: GateId,
    peer_index: u32,
    seq: u64,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.peer_index == other.peer_index && self.seq == other.seq
    }
}
impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest peer index serviced first; among equal peer indices, the
        // one inserted earlier (lower seq) wins. `BinaryHeap` pops the
        // maximum, so seq comparison is reversed to make the earliest
        // insertion compare as the greatest.
        self.peer_index
            .cmp(&other.peer_index)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-node ingress/egress shaper. `Outer -> Inner` traffic (from a peer,
/// inbound to this node's own logic) is shaped by `incoming_rate_bps` and
/// served FIFO; `Inner -> Outer` traffic (from this node's own logic,
/// outbound to a peer) is shaped by `outgoing_rate_bps` and served by
/// descending peer index.
#[derive(Debug, Clone)]
pub struct NodeRateLimiter {
    config: RateLimiterConfig,
    incoming: VecDeque<Queued>,
    outgoing: BinaryHeap<Queued>,
    next_seq: u64,
    incoming_active: bool,
    outgoing_active: bool,
}

impl NodeRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            incoming: VecDeque::new(),
            outgoing: BinaryHeap::new(),
            next_seq: 0,
            incoming_active: false,
            outgoing_active: false,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let s = self.next_seq;
        self.next_seq += 1;
        s
    }

    /// An envelope arrived at gate vector `from_vector`/`from_index` bound
    /// for `dest`. Routing only permits `Inner -> Outer` (outgoing) and
    /// `Outer -> Inner` (incoming); anything else is a fatal routing
    /// violation, matching the original's `"help me"` unreachable branches.
    pub fn on_arrival(
        &mut self,
        from_vector: GateVector,
        from_index: u32,
        dest: GateId,
        envelope: Envelope,
    ) -> Result<Vec<Effect<Timer>>, SimError> {
        match from_vector {
            GateVector::Inner => Ok(self.enqueue_outgoing(from_index, dest, envelope)),
            GateVector::Outer => Ok(self.enqueue_incoming(from_index, dest, envelope)),
            GateVector::Producer => Err(SimError::RoutingViolation(format!(
                "rate limiter received an envelope on a Producer gate (index {from_index})"
            ))),
        }
    }

    fn enqueue_outgoing(&mut self, peer_index: u32, dest: GateId, envelope: Envelope) -> Vec<Effect<Timer>> {
        if self.config.outgoing_rate_bps == 0.0 {
            return vec![Effect::send(dest, envelope)];
        }
        let seq = self.next_seq();
        let was_empty = self.outgoing.is_empty();
        self.outgoing.push(Queued {
            envelope,
            dest,
            peer_index,
            seq,
        });
        if was_empty {
            self.outgoing_active = true;
            vec![self.schedule_outgoing_service()]
        } else {
            vec![]
        }
    }

    fn enqueue_incoming(&mut self, peer_index: u32, dest: GateId, envelope: Envelope) -> Vec<Effect<Timer>> {
        if self.config.incoming_rate_bps == 0.0 {
            return vec![Effect::send(dest, envelope)];
        }
        let seq = self.next_seq();
        let was_empty = self.incoming.is_empty();
        self.incoming.push_back(Queued {
            envelope,
            dest,
            peer_index,
            seq,
        });
        if was_empty {
            self.incoming_active = true;
            vec![self.schedule_incoming_service()]
        } else {
            vec![]
        }
    }

    fn schedule_outgoing_service(&self) -> Effect<Timer> {
        let front = self.outgoing.peek().expect("just pushed");
        let delay = SimDuration::from_secs_f64(
            front.envelope.bit_length as f64 / self.config.outgoing_rate_bps,
        );
        Effect::schedule(Timer::ServiceOutgoing, delay)
    }

    fn schedule_incoming_service(&self) -> Effect<Timer> {
        let front = self.incoming.front().expect("just pushed");
        let delay = SimDuration::from_secs_f64(
            front.envelope.bit_length as f64 / self.config.incoming_rate_bps,
        );
        Effect::schedule(Timer::ServiceIncoming, delay)
    }

    /// Drains one item from the direction named by `timer`, emitting a
    /// `Send` for it and, if the queue is still non-empty, rescheduling
    /// itself for the new front of the queue.
    pub fn on_timer(&mut self, timer: Timer) -> Vec<Effect<Timer>> {
        match timer {
            Timer::ServiceOutgoing => {
                let Some(item) = self.outgoing.pop() else {
                    self.outgoing_active = false;
                    return vec![];
                };
                let mut effects = vec![Effect::send(item.dest, item.envelope)];
                if !self.outgoing.is_empty() {
                    effects.push(self.schedule_outgoing_service());
                } else {
                    self.outgoing_active = false;
                }
                effects
            }
            Timer::ServiceIncoming => {
                let Some(item) = self.incoming.pop_front() else {
                    self.incoming_active = false;
                    return vec![];
                };
                let mut effects = vec![Effect::send(item.dest, item.envelope)];
                if !self.incoming.is_empty() {
                    effects.push(self.schedule_incoming_service());
                } else {
                    self.incoming_active = false;
                }
                effects
            }
        }
    }

    pub fn outgoing_queue_len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn incoming_queue_len(&self) -> usize {
        self.incoming.len()
    }
}
