//! Per-node composition.
//!
//! A simulated node is three pure domain components wired together:
//! `rate-limiter` shapes traffic between this node's own logic (`Inner`
//! gates) and its peer links (`Outer` gates); `p2p-dissemination` runs one
//! of the three block-propagation disciplines; the driver is either
//! `mining-driver` or `honeybadger-epoch`, mining blocks and feeding them to
//! dissemination via the `Producer` loopback.
//!
//! None of the three ever touches the event kernel: each returns a
//! `Vec<Effect<T>>` describing what it wants to happen. `Node::handle` is
//! the only place those effects are interpreted. A `Send` addressed to an
//! `Outer` gate is a genuine cross-node message and passes straight through
//! to the kernel; a `Send` addressed to `Inner` or `Producer` is a local
//! hop between two of this node's own components and is resolved here,
//! which can itself produce further effects needing the same treatment —
//! `interpret_*` below is a small worklist-free recursion over that chain.

use event_kernel::{KernelEvent, Module};
use honeybadger_epoch::HoneyBadgerCoordinator;
use mining_driver::MiningDriver;
use p2p_dissemination::Dissemination;
use rate_limiter::NodeRateLimiter;
use shared_types::{Block, Direction, Effect, Envelope, EnvelopeKind, GateId, GateVector, NodeId, SimTime};
use std::collections::HashMap;

use crate::config::{DriverConfig, NodeConfig};

/// A node's own timer vocabulary: the union of what each owned component
/// can self-schedule, tagged by which component it belongs to so
/// `Node::handle` knows which one to redeliver it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTimer {
    RateLimiter(rate_limiter::Timer),
    Dissemination(p2p_dissemination::Timer),
    Driver(DriverTimer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverTimer {
    Mining(mining_driver::Timer),
    HoneyBadger(honeybadger_epoch::Timer),
}

enum Driver {
    Mining(MiningDriver),
    HoneyBadger(HoneyBadgerCoordinator),
}

impl Driver {
    fn start(&mut self) -> Vec<Effect<DriverTimer>> {
        match self {
            Driver::Mining(d) => remap(d.start(), DriverTimer::Mining),
            Driver::HoneyBadger(d) => remap(d.start(), DriverTimer::HoneyBadger),
        }
    }

    fn on_timer(&mut self, now: SimTime, timer: DriverTimer) -> Vec<Effect<DriverTimer>> {
        match (self, timer) {
            (Driver::Mining(d), DriverTimer::Mining(t)) => remap(d.on_timer(now, t), DriverTimer::Mining),
            (Driver::HoneyBadger(d), DriverTimer::HoneyBadger(t)) => {
                remap(d.on_timer(now, t), DriverTimer::HoneyBadger)
            }
            (Driver::Mining(_), DriverTimer::HoneyBadger(_))
            | (Driver::HoneyBadger(_), DriverTimer::Mining(_)) => {
                unreachable!("a node's own timers never name the other driver kind")
            }
        }
    }

    fn on_block_received(&mut self, block: Block) -> Vec<Effect<DriverTimer>> {
        match self {
            Driver::Mining(d) => remap(d.on_block_received(block), DriverTimer::Mining),
            Driver::HoneyBadger(d) => remap(d.on_block_received(block), DriverTimer::HoneyBadger),
        }
    }
}

/// Converts a batch of effects tagged with one component's timer type to
/// another by mapping only the `ScheduleTimer` payload; the other three
/// variants carry no timer-typed field.
fn remap<A, B>(effects: Vec<Effect<A>>, f: impl Fn(A) -> B) -> Vec<Effect<B>> {
    effects
        .into_iter()
        .map(|effect| match effect {
            Effect::Send { to_gate, envelope } => Effect::Send { to_gate, envelope },
            Effect::ScheduleTimer { timer, delay } => Effect::ScheduleTimer { timer: f(timer), delay },
            Effect::CancelTimer { handle } => Effect::CancelTimer { handle },
            Effect::RecordSample { histogram, sample } => Effect::RecordSample { histogram, sample },
        })
        .collect()
}

pub struct Node {
    self_node: NodeId,
    rate_limiter: NodeRateLimiter,
    dissemination: Dissemination,
    driver: Driver,
}

impl Node {
    pub fn new(self_node: NodeId, peers: &[NodeId], config: NodeConfig) -> Self {
        let rate_limiter = NodeRateLimiter::new(config.rate_limiter);
        let dissemination = Dissemination::new(self_node, peers, config.dissemination);
        let driver = match config.driver {
            DriverConfig::Mining(mining_config) => {
                Driver::Mining(MiningDriver::new(self_node, mining_config, config.seed))
            }
            DriverConfig::HoneyBadger(hb_config) => {
                let peer_index: HashMap<NodeId, u32> = peers
                    .iter()
                    .enumerate()
                    .map(|(i, &n)| (n, i as u32))
                    .collect();
                Driver::HoneyBadger(HoneyBadgerCoordinator::new(
                    self_node,
                    hb_config,
                    peer_index,
                    config.proc_time,
                ))
            }
        };
        Self {
            self_node,
            rate_limiter,
            dissemination,
            driver,
        }
    }

    /// Arms this node's first mining/epoch timer. Call once per node before
    /// the run starts.
    pub fn start(&mut self) -> Vec<Effect<NodeTimer>> {
        let effects = self.driver.start();
        self.interpret_driver(SimTime::ZERO, effects)
    }

    fn outer_out(&self, peer_index: u32) -> GateId {
        GateId::new(self.self_node, GateVector::Outer, peer_index, Direction::Out)
    }

    fn inner_out(&self, peer_index: u32) -> GateId {
        GateId::new(self.self_node, GateVector::Inner, peer_index, Direction::Out)
    }

    fn extract_block(envelope: Envelope) -> Block {
        match envelope.kind {
            EnvelopeKind::BlockBody { block } => block,
            other => unreachable!("a Producer-gate send only ever carries a block body, got {other:?}"),
        }
    }

    fn interpret_rate_limiter(&mut self, now: SimTime, effects: Vec<Effect<rate_limiter::Timer>>) -> Vec<Effect<NodeTimer>> {
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Send { to_gate, envelope } if to_gate.vector == GateVector::Outer => {
                    out.push(Effect::send(to_gate, envelope));
                }
                Effect::Send { to_gate, envelope } => {
                    // Inner: traffic the limiter just released, bound for
                    // this node's own P2P state machine.
                    let effects = self
                        .dissemination
                        .on_envelope(now, to_gate.index, envelope)
                        .expect("the rate limiter only ever addresses dissemination on a real peer index");
                    out.extend(self.interpret_dissemination(now, effects));
                }
                Effect::ScheduleTimer { timer, delay } => {
                    out.push(Effect::schedule(NodeTimer::RateLimiter(timer), delay));
                }
                Effect::CancelTimer { handle } => out.push(Effect::cancel(handle)),
                Effect::RecordSample { histogram, sample } => out.push(Effect::sample(histogram, sample)),
            }
        }
        out
    }

    fn interpret_dissemination(&mut self, now: SimTime, effects: Vec<Effect<p2p_dissemination::Timer>>) -> Vec<Effect<NodeTimer>> {
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Send { to_gate, envelope } if to_gate.vector == GateVector::Producer => {
                    let effects = self.driver.on_block_received(Self::extract_block(envelope));
                    out.extend(self.interpret_driver(now, effects));
                }
                Effect::Send { to_gate, envelope } => {
                    // Inner: an egress request, shaped by the rate limiter
                    // before it ever reaches a peer.
                    let dest = self.outer_out(to_gate.index);
                    let effects = self
                        .rate_limiter
                        .on_arrival(GateVector::Inner, to_gate.index, dest, envelope)
                        .expect("dissemination only ever addresses the rate limiter's Inner side");
                    out.extend(self.interpret_rate_limiter(now, effects));
                }
                Effect::ScheduleTimer { timer, delay } => {
                    out.push(Effect::schedule(NodeTimer::Dissemination(timer), delay));
                }
                Effect::CancelTimer { handle } => out.push(Effect::cancel(handle)),
                Effect::RecordSample { histogram, sample } => out.push(Effect::sample(histogram, sample)),
            }
        }
        out
    }

    fn interpret_driver(&mut self, now: SimTime, effects: Vec<Effect<DriverTimer>>) -> Vec<Effect<NodeTimer>> {
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Send { to_gate, envelope } if to_gate.vector == GateVector::Producer => {
                    let effects = self
                        .dissemination
                        .on_local_block_mined(now, Self::extract_block(envelope));
                    out.extend(self.interpret_dissemination(now, effects));
                }
                Effect::Send { to_gate, envelope } => {
                    // Inner: HoneyBadger's GotBlock acks bypass dissemination
                    // entirely and go straight to the rate limiter.
                    let dest = self.outer_out(to_gate.index);
                    let effects = self
                        .rate_limiter
                        .on_arrival(GateVector::Inner, to_gate.index, dest, envelope)
                        .expect("the driver only ever addresses the rate limiter's Inner side");
                    out.extend(self.interpret_rate_limiter(now, effects));
                }
                Effect::ScheduleTimer { timer, delay } => {
                    out.push(Effect::schedule(NodeTimer::Driver(timer), delay));
                }
                Effect::CancelTimer { handle } => out.push(Effect::cancel(handle)),
                Effect::RecordSample { histogram, sample } => out.push(Effect::sample(histogram, sample)),
            }
        }
        out
    }
}

impl Module for Node {
    type Timer = NodeTimer;

    fn handle(&mut self, now: SimTime, event: KernelEvent<NodeTimer>) -> Vec<Effect<NodeTimer>> {
        match event {
            KernelEvent::Timer(NodeTimer::RateLimiter(t)) => {
                let effects = self.rate_limiter.on_timer(t);
                self.interpret_rate_limiter(now, effects)
            }
            KernelEvent::Timer(NodeTimer::Dissemination(t)) => {
                let out_len = self.rate_limiter.outgoing_queue_len();
                let effects = self.dissemination.on_timer(now, t, out_len);
                self.interpret_dissemination(now, effects)
            }
            KernelEvent::Timer(NodeTimer::Driver(t)) => {
                let effects = self.driver.on_timer(now, t);
                self.interpret_driver(now, effects)
            }
            KernelEvent::Message { gate, envelope } => {
                // Only ever a real peer link delivering into this node's
                // Outer side; the gate fabric never wires Inner/Producer.
                let dest = self.inner_out(gate.index);
                let effects = self
                    .rate_limiter
                    .on_arrival(GateVector::Outer, gate.index, dest, envelope)
                    .expect("the fabric only ever delivers Outer-addressed envelopes");
                self.interpret_rate_limiter(now, effects)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mining_driver::{MiningConfig, MiningMode};
    use shared_types::SimDuration;

    fn continuous_config() -> NodeConfig {
        NodeConfig {
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::Continuous {
                    mining_rate_per_sec: 1.0,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..NodeConfig::default()
        }
    }

    #[test]
    fn starting_a_mining_node_arms_exactly_one_timer() {
        let mut node = Node::new(NodeId(0), &[NodeId(1)], continuous_config());
        let effects = node.start();
        assert_eq!(effects.len(), 1);
        assert!(matches!(
            effects[0],
            Effect::ScheduleTimer {
                timer: NodeTimer::Driver(DriverTimer::Mining(mining_driver::Timer::Mine)),
                ..
            }
        ));
    }

    #[test]
    fn self_mined_block_escapes_as_an_outer_send_to_every_peer() {
        let mut node = Node::new(NodeId(0), &[NodeId(1), NodeId(2)], continuous_config());
        node.start();
        let effects = node.handle(
            SimTime::ZERO,
            KernelEvent::Timer(NodeTimer::Driver(DriverTimer::Mining(mining_driver::Timer::Mine))),
        );
        let outer_sends: Vec<_> = effects
            .iter()
            .filter(|e| matches!(e, Effect::Send { to_gate, .. } if to_gate.vector == GateVector::Outer))
            .collect();
        assert_eq!(outer_sends.len(), 2);
    }

    #[test]
    fn an_envelope_arriving_on_outer_reaches_dissemination_via_the_limiter() {
        let mut node = Node::new(NodeId(0), &[NodeId(1)], continuous_config());
        let block = Block::new(NodeId(1), 0, 1, SimTime::ZERO);
        let gate = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::In);
        let effects = node.handle(
            SimTime::ZERO,
            KernelEvent::Message {
                gate,
                envelope: Envelope::new_block_hash(NodeId(1), block),
            },
        );
        // HashAnnounce: learning a new hash immediately re-broadcasts it and
        // requests the body, both via this node's single peer link.
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Send { to_gate, .. } if to_gate.vector == GateVector::Outer)));
    }
}
