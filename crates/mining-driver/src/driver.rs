//! Block production and the block-processing queue, grounded on
//! `original_source/Miner.cc`: `mineBlock()`/`procBlock()` become
//! `mine_and_process` (self-mined blocks process with zero delay and
//! disseminate immediately); `blockProcQueue`/`nextProcBlock` become
//! `on_block_received`/`Timer::ProcessQueue`, serializing externally
//! received blocks through `proc_time` one at a time.

use crate::config::{MiningConfig, MiningMode};
use crate::timer::Timer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Poisson};
use shared_types::{Block, Direction, Effect, Envelope, GateId, GateVector, NodeId, SimTime};
use std::collections::VecDeque;

pub struct MiningDriver {
    self_node: NodeId,
    config: MiningConfig,
    next_seq: u64,
    best_level: u64,
    proc_queue: VecDeque<Block>,
    proc_active: bool,
    rng: StdRng,
}

impl MiningDriver {
    pub fn new(self_node: NodeId, config: MiningConfig, seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed ^ (self_node.0 as u64).wrapping_mul(0x9E37_79B9));
        Self {
            self_node,
            config,
            next_seq: 0,
            best_level: 0,
            proc_queue: VecDeque::new(),
            proc_active: false,
            rng,
        }
    }

    pub fn best_level(&self) -> u64 {
        self.best_level
    }

    /// Arms this node's first mining timer. Call once at run start.
    pub fn start(&mut self) -> Vec<Effect<Timer>> {
        vec![self.schedule_next_mine()]
    }

    fn producer_gate(&self) -> GateId {
        GateId::new(self.self_node, GateVector::Producer, 0, Direction::Out)
    }

    fn mine_block(&mut self, now: SimTime) -> Block {
        let seq = self.next_seq;
        self.next_seq += 1;
        let height = self.best_level + 1;
        Block::new(self.self_node, seq, height, now)
    }

    /// Updates `best_level`, samples `blockDelay`, and (only for blocks
    /// this node mined itself) hands the block to dissemination. Mirrors
    /// `Miner::procBlock`, which is called both for self-mined blocks
    /// (immediately, "does not take time") and for queued ones (after
    /// `proc_time`), but only self-mined blocks are re-sent to the P2P
    /// layer — externally-received ones were already disseminated by the
    /// node that forwarded them.
    fn proc_block(&mut self, now: SimTime, block: Block, announce: bool) -> Vec<Effect<Timer>> {
        if block.height > self.best_level {
            self.best_level = block.height;
        }
        let delay = (now - block.time_mined).as_secs_f64();
        let mut effects = vec![Effect::sample("blockDelay", delay)];
        if announce {
            effects.push(Effect::send(
                self.producer_gate(),
                Envelope::block_body(self.self_node, block, 0),
            ));
        }
        effects
    }

    fn schedule_next_mine(&mut self) -> Effect<Timer> {
        let delay = match self.config.mode {
            MiningMode::Continuous { mining_rate_per_sec } => {
                let dist = Exp::new(mining_rate_per_sec).expect("positive mining rate");
                shared_types::SimDuration::from_secs_f64(dist.sample(&mut self.rng))
            }
            MiningMode::Round { round_interval, .. }
            | MiningMode::FixedCommittee { round_interval, .. } => round_interval,
        };
        Effect::schedule(Timer::Mine, delay)
    }

    fn on_mine(&mut self, now: SimTime) -> Vec<Effect<Timer>> {
        let mut effects = Vec::new();
        match self.config.mode {
            MiningMode::Continuous { .. } => {
                let block = self.mine_block(now);
                effects.extend(self.proc_block(now, block, true));
            }
            MiningMode::Round {
                round_interval,
                mining_rate_per_sec,
            } => {
                let lambda = round_interval.as_secs_f64() * mining_rate_per_sec;
                let dist = Poisson::new(lambda.max(f64::MIN_POSITIVE)).expect("finite rate");
                let n = dist.sample(&mut self.rng).round() as u64;
                for _ in 0..n {
                    let block = self.mine_block(now);
                    effects.extend(self.proc_block(now, block, true));
                }
            }
            MiningMode::FixedCommittee { committee_size, .. } => {
                if (self.self_node.0 as u32) < committee_size {
                    let block = self.mine_block(now);
                    effects.extend(self.proc_block(now, block, true));
                }
            }
        }
        effects.push(self.schedule_next_mine());
        effects
    }

    /// A block body has finished arriving from the P2P layer. Enters the
    /// processing queue; if nothing was already in flight, arms
    /// `Timer::ProcessQueue` for `proc_time` from now.
    pub fn on_block_received(&mut self, block: Block) -> Vec<Effect<Timer>> {
        let was_idle = !self.proc_active;
        self.proc_queue.push_back(block);
        if was_idle {
            self.proc_active = true;
            vec![Effect::schedule(Timer::ProcessQueue, self.config.proc_time)]
        } else {
            vec![]
        }
    }

    fn on_process_queue(&mut self, now: SimTime) -> Vec<Effect<Timer>> {
        let Some(block) = self.proc_queue.pop_front() else {
            self.proc_active = false;
            return vec![];
        };
        let mut effects = self.proc_block(now, block, false);
        if !self.proc_queue.is_empty() {
            effects.push(Effect::schedule(Timer::ProcessQueue, self.config.proc_time));
        } else {
            self.proc_active = false;
        }
        effects
    }

    pub fn on_timer(&mut self, now: SimTime, timer: Timer) -> Vec<Effect<Timer>> {
        match timer {
            Timer::Mine => self.on_mine(now),
            Timer::ProcessQueue => self.on_process_queue(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SimDuration;

    #[test]
    fn fixed_committee_mines_only_below_committee_size() {
        let config = MiningConfig {
            mode: MiningMode::FixedCommittee {
                round_interval: SimDuration::from_secs_f64(1.0),
                committee_size: 2,
            },
            proc_time: SimDuration::ZERO,
        };
        let mut in_committee = MiningDriver::new(NodeId(1), config, 0);
        let effects = in_committee.on_mine(SimTime::ZERO);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Send { .. })));

        let mut out_of_committee = MiningDriver::new(NodeId(5), config, 0);
        let effects = out_of_committee.on_mine(SimTime::ZERO);
        assert!(!effects.iter().any(|e| matches!(e, Effect::Send { .. })));
    }

    #[test]
    fn received_blocks_serialize_through_proc_time() {
        let config = MiningConfig {
            mode: MiningMode::Continuous {
                mining_rate_per_sec: 1.0,
            },
            proc_time: SimDuration::from_secs_f64(2.0),
        };
        let mut d = MiningDriver::new(NodeId(0), config, 42);
        let a = Block::new(NodeId(1), 0, 1, SimTime::ZERO);
        let b = Block::new(NodeId(1), 1, 2, SimTime::ZERO);

        let first = d.on_block_received(a);
        assert!(matches!(first[0], Effect::ScheduleTimer { .. }));
        let second = d.on_block_received(b);
        assert!(second.is_empty());

        let drained = d.on_process_queue(SimTime(1));
        assert!(drained
            .iter()
            .any(|e| matches!(e, Effect::ScheduleTimer { .. })));
        assert_eq!(d.best_level(), 1);

        let drained = d.on_process_queue(SimTime(3));
        assert!(!drained
            .iter()
            .any(|e| matches!(e, Effect::ScheduleTimer { .. })));
        assert_eq!(d.best_level(), 2);
    }

    #[test]
    fn self_mined_blocks_announce_with_zero_delay() {
        let config = MiningConfig::default();
        let mut d = MiningDriver::new(NodeId(0), config, 7);
        let effects = d.on_mine(SimTime(100));
        let sampled = effects.iter().find_map(|e| match e {
            Effect::RecordSample { histogram, sample } if *histogram == "blockDelay" => {
                Some(*sample)
            }
            _ => None,
        });
        assert_eq!(sampled, Some(0.0));
    }
}
