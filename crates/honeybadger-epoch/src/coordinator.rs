//! Epoch-driven mining and reception counting, grounded on
//! `original_source/HoneyBadger.cc`. Every node mines exactly one block per
//! epoch and broadcasts it plus a `GotBlock` acknowledgement to every peer;
//! the epoch advances once `num_nodes^2` receptions (local processing plus
//! every peer's ack) have accrued for the current epoch.

use crate::config::HoneyBadgerConfig;
use crate::timer::Timer;
use shared_types::{
    Block, Direction, Effect, Envelope, GateId, GateVector, NodeId, SimDuration, SimTime,
};
use std::collections::{HashMap, VecDeque};

pub struct HoneyBadgerCoordinator {
    self_node: NodeId,
    config: HoneyBadgerConfig,
    peer_index: HashMap<NodeId, u32>,
    proc_time: SimDuration,
    next_block_seq: u64,
    epochs: HashMap<u64, u32>,
    last_epoch_finish: SimTime,
    proc_queue: VecDeque<Block>,
    proc_active: bool,
}

impl HoneyBadgerCoordinator {
    pub fn new(
        self_node: NodeId,
        config: HoneyBadgerConfig,
        peer_index: HashMap<NodeId, u32>,
        proc_time: SimDuration,
    ) -> Self {
        Self {
            self_node,
            config,
            peer_index,
            proc_time,
            next_block_seq: 0,
            epochs: HashMap::new(),
            last_epoch_finish: SimTime::ZERO,
            proc_queue: VecDeque::new(),
            proc_active: false,
        }
    }

    /// Starts epoch 0. Call once at run start.
    pub fn start(&self) -> Vec<Effect<Timer>> {
        vec![Effect::schedule(Timer::Mine, SimDuration::ZERO)]
    }

    fn inner_gate(&self, peer_index: u32) -> GateId {
        GateId::new(self.self_node, GateVector::Inner, peer_index, Direction::Out)
    }

    fn producer_gate(&self) -> GateId {
        GateId::new(self.self_node, GateVector::Producer, 0, Direction::Out)
    }

    fn broadcast_got_block(&self, epoch: u64) -> Vec<Effect<Timer>> {
        self.peer_index
            .values()
            .map(|&idx| Effect::send(self.inner_gate(idx), Envelope::got_block(self.self_node, epoch, self.self_node)))
            .collect()
    }

    fn mine_block(&mut self, now: SimTime) -> Block {
        let seq = self.next_block_seq;
        self.next_block_seq += 1;
        Block::new(self.self_node, seq, seq, now)
    }

    /// Records processing of `block` and acks it to every peer. Only
    /// self-mined blocks (`announce`) are also handed to the producer gate
    /// for dissemination to peers; blocks arriving via dissemination have
    /// already been flooded to the rest of the network by that layer's own
    /// heard-set logic, so re-announcing them here would just duplicate
    /// that work.
    fn proc_block(&mut self, now: SimTime, block: Block, announce: bool) -> Vec<Effect<Timer>> {
        let epoch = block.seq;
        let mut effects = self.confirm_reception(now, epoch);
        if announce {
            effects.push(Effect::send(
                self.producer_gate(),
                Envelope::block_body(self.self_node, block, 0),
            ));
        }
        effects.extend(self.broadcast_got_block(epoch));
        effects
    }

    /// Increments the reception counter for `epoch`; if it is still the
    /// current epoch and has reached the quorum, schedules the next `Mine`
    /// and samples the round-interval histogram. The `epoch ==
    /// next_block_seq - 1` guard prevents scheduling more than one
    /// `nextMine` while still inside the current epoch.
    fn confirm_reception(&mut self, now: SimTime, epoch: u64) -> Vec<Effect<Timer>> {
        let count = self.epochs.entry(epoch).or_insert(0);
        *count += 1;
        let count = *count;

        let quorum = (self.config.num_nodes as u64) * (self.config.num_nodes as u64);
        let is_current_epoch = self.next_block_seq > 0 && epoch == self.next_block_seq - 1;
        if is_current_epoch && count as u64 >= quorum {
            let interval = now - self.last_epoch_finish;
            self.last_epoch_finish = now;
            vec![
                Effect::schedule(Timer::Mine, SimDuration::ZERO),
                Effect::sample("roundInterval", interval.as_secs_f64()),
            ]
        } else {
            vec![]
        }
    }

    fn on_mine(&mut self, now: SimTime) -> Vec<Effect<Timer>> {
        let block = self.mine_block(now);
        self.proc_block(now, block, true)
    }

    /// A block body arrived from a peer. Enters the processing queue,
    /// mirroring the block-processing queue discipline shared with
    /// `mining-driver`.
    pub fn on_block_received(&mut self, block: Block) -> Vec<Effect<Timer>> {
        let was_idle = !self.proc_active;
        self.proc_queue.push_back(block);
        if was_idle {
            self.proc_active = true;
            vec![Effect::schedule(Timer::ProcessQueue, self.proc_time)]
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
            effects.push(Effect::schedule(Timer::ProcessQueue, self.proc_time));
        } else {
            self.proc_active = false;
        }
        effects
    }

    /// A `GotBlock` ack arrived from a peer; confirms immediately, not
    /// through the processing queue.
    pub fn on_got_block(&mut self, now: SimTime, epoch: u64) -> Vec<Effect<Timer>> {
        self.confirm_reception(now, epoch)
    }

    pub fn on_timer(&mut self, now: SimTime, timer: Timer) -> Vec<Effect<Timer>> {
        match timer {
            Timer::Mine => self.on_mine(now),
            Timer::ProcessQueue => self.on_process_queue(now),
        }
    }
}
