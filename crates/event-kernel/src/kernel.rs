//! The kernel: owns the event queue and the gate fabric, and drives the
//! single-threaded run loop. Modules are dispatched through one capability
//! trait (`Module`) instead of a common base class + downcasting — the
//! kernel never needs to know which concrete domain logic a node runs.

use crate::fabric::GateFabric;
use crate::queue::EventQueue;
use shared_types::{Effect, Envelope, GateId, NodeId, SimDuration, SimError, SimTime, TimerHandle};
use std::collections::HashMap;

/// What the queue actually stores: either one of a module's own timer
/// values, or an envelope that arrived on a specific gate.
#[derive(Debug, Clone)]
pub enum KernelEvent<Timer> {
    Timer(Timer),
    Message { gate: GateId, envelope: Envelope },
}

/// The capability every simulated node implements. `Timer` is that node's
/// own vocabulary of self-scheduled events (mining inter-arrival, rate
/// limiter service completion, epoch timeout, ...).
pub trait Module {
    type Timer;

    fn handle(
        &mut self,
        now: SimTime,
        event: KernelEvent<Self::Timer>,
    ) -> Vec<Effect<Self::Timer>>;
}

/// Callback invoked for every `RecordSample` effect the kernel processes,
/// so `sim-telemetry` stays a dependency of the caller, not of the kernel.
pub type SampleSink<'a> = dyn FnMut(NodeId, &str, f64) + 'a;

pub struct Kernel<M: Module> {
    now: SimTime,
    queue: EventQueue<KernelEvent<M::Timer>>,
    fabric: GateFabric,
    modules: HashMap<NodeId, M>,
}

impl<M: Module> Kernel<M> {
    pub fn new(fabric: GateFabric) -> Self {
        Self {
            now: SimTime::ZERO,
            queue: EventQueue::new(),
            fabric,
            modules: HashMap::new(),
        }
    }

    pub fn insert_module(&mut self, node: NodeId, module: M) {
        self.modules.insert(node, module);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn module(&self, node: NodeId) -> Option<&M> {
        self.modules.get(&node)
    }

    pub fn module_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.modules.get_mut(&node)
    }

    /// Schedules `timer` to fire on `node` after `delay`.
    pub fn schedule_timer(&mut self, node: NodeId, timer: M::Timer, delay: SimDuration) -> TimerHandle {
        self.queue
            .push(self.now.saturating_add(delay), node, KernelEvent::Timer(timer))
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) {
        self.queue.cancel(handle);
    }

    /// Routes `envelope` from `to_gate` through the fabric to the connected
    /// peer gate, delivering it at the current instant (the kernel models
    /// no link latency of its own; transit delay is the rate limiter's
    /// job).
    pub fn send(&mut self, to_gate: GateId, envelope: Envelope) -> Result<(), SimError> {
        let peer_gate = self.fabric.resolve(to_gate)?;
        self.queue.push(
            self.now,
            peer_gate.node,
            KernelEvent::Message {
                gate: peer_gate,
                envelope,
            },
        );
        Ok(())
    }

    /// Interprets a batch of effects a module returned from `handle`. Each
    /// `ScheduleTimer` effect produces the handle for the caller to record;
    /// other effects produce `None` at that position.
    pub fn apply_effects(
        &mut self,
        node: NodeId,
        effects: Vec<Effect<M::Timer>>,
        sample_sink: &mut SampleSink,
    ) -> Result<Vec<Option<TimerHandle>>, SimError> {
        let mut handles = Vec::with_capacity(effects.len());
        for effect in effects {
            let handle = match effect {
                Effect::Send { to_gate, envelope } => {
                    self.send(to_gate, envelope)?;
                    None
                }
                Effect::ScheduleTimer { timer, delay } => {
                    Some(self.schedule_timer(node, timer, delay))
                }
                Effect::CancelTimer { handle } => {
                    self.cancel_timer(handle);
                    None
                }
                Effect::RecordSample { histogram, sample } => {
                    sample_sink(node, histogram, sample);
                    None
                }
            };
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Pops and dispatches exactly one event, applying the effects it
    /// produces. Returns `None` once the queue is drained.
    pub fn step(&mut self, sample_sink: &mut SampleSink) -> Result<Option<SimTime>, SimError> {
        let Some(delivery) = self.queue.pop() else {
            return Ok(None);
        };
        self.now = delivery.time;
        let node = delivery.target;
        let Some(module) = self.modules.get_mut(&node) else {
            return Err(SimError::InvariantViolation(format!(
                "event targeted unknown node {node}"
            )));
        };
        let effects = module.handle(self.now, delivery.event);
        self.apply_effects(node, effects, sample_sink)?;
        Ok(Some(self.now))
    }

    /// Runs until the queue drains or `deadline` is reached, whichever is
    /// first. Events scheduled exactly at `deadline` are still delivered.
    pub fn run_until(&mut self, deadline: SimTime, sample_sink: &mut SampleSink) -> Result<(), SimError> {
        while let Some(next) = self.queue.peek_time() {
            if next > deadline {
                break;
            }
            if self.step(sample_sink)?.is_none() {
                break;
            }
        }
        Ok(())
    }

    pub fn run_to_completion(&mut self, sample_sink: &mut SampleSink) -> Result<(), SimError> {
        while self.step(sample_sink)?.is_some() {}
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Direction, GateVector};

    #[derive(Clone)]
    enum Timer {
        Tick,
    }

    struct CountingModule {
        ticks: u32,
        max_ticks: u32,
    }

    impl Module for CountingModule {
        type Timer = Timer;

        fn handle(&mut self, _now: SimTime, event: KernelEvent<Timer>) -> Vec<Effect<Timer>> {
            match event {
                KernelEvent::Timer(Timer::Tick) => {
                    self.ticks += 1;
                    if self.ticks < self.max_ticks {
                        vec![Effect::schedule(Timer::Tick, SimDuration::from_nanos(1))]
                    } else {
                        vec![]
                    }
                }
                KernelEvent::Message { .. } => vec![],
            }
        }
    }

    #[test]
    fn self_rescheduling_module_runs_to_completion() {
        let mut kernel: Kernel<CountingModule> = Kernel::new(GateFabric::new());
        kernel.insert_module(
            NodeId(0),
            CountingModule {
                ticks: 0,
                max_ticks: 5,
            },
        );
        kernel.schedule_timer(NodeId(0), Timer::Tick, SimDuration::ZERO);
        let mut sink = |_: NodeId, _: &str, _: f64| {};
        kernel.run_to_completion(&mut sink).unwrap();
        assert_eq!(kernel.module(NodeId(0)).unwrap().ticks, 5);
        assert!(kernel.is_idle());
    }

    #[test]
    fn send_requires_a_connected_gate() {
        let mut kernel: Kernel<CountingModule> = Kernel::new(GateFabric::new());
        let g = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::Out);
        let envelope = shared_types::Envelope::new_block_hash(
            NodeId(0),
            shared_types::Block::new(NodeId(0), 1, 0, SimTime::ZERO),
        );
        assert!(kernel.send(g, envelope).is_err());
    }
}
