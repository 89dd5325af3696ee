//! The P2P state machine: tracks what each node knows about each block and
//! drives one of the three dissemination disciplines. Grounded on
//! `original_source/NodeP2P.cc` and `FullNode.cc` for the hash-announce
//! discipline's `heardBlocks`/`reqdBlocks` bookkeeping; the chunked and
//! gossip disciplines generalize the same bookkeeping to sub-block units.

use crate::config::{Discipline, DisseminationConfig};
use crate::timer::Timer;
use shared_types::{
    Block, BlockId, BlockMeta, ChunkMap, Direction, Effect, Envelope, EnvelopeKind, GateId,
    GateVector, NodeId, SimError, SimTime,
};
use std::collections::{HashMap, HashSet};

/// Per-node P2P dissemination state. One instance per simulated node.
pub struct Dissemination {
    self_node: NodeId,
    peer_index: HashMap<NodeId, u32>,
    config: DisseminationConfig,

    /// Block headers this node has learned of, keyed by canonical id.
    headers: HashMap<BlockId, Block>,
    /// Lifecycle state per block, as tracked locally: which chunks are
    /// downloaded/requested, and (under `AvailabilityGossip`) what's known
    /// about each peer's own availability and requests.
    meta: HashMap<BlockId, BlockMeta>,
    /// Every block id ever announced to this node, so a repeat
    /// announcement is a no-op rather than a re-request.
    heard: HashSet<BlockId>,

    fill_step_armed: bool,
}

impl Dissemination {
    pub fn new(self_node: NodeId, peers: &[NodeId], config: DisseminationConfig) -> Self {
        let peer_index = peers
            .iter()
            .enumerate()
            .map(|(i, &n)| (n, i as u32))
            .collect();
        Self {
            self_node,
            peer_index,
            config,
            headers: HashMap::new(),
            meta: HashMap::new(),
            heard: HashSet::new(),
            fill_step_armed: false,
        }
    }

    pub fn block_meta(&self, id: BlockId) -> Option<&BlockMeta> {
        self.meta.get(&id)
    }

    fn meta_entry(&mut self, id: BlockId) -> &mut BlockMeta {
        let total = self.config.total_chunks;
        self.meta.entry(id).or_insert_with(|| BlockMeta::learned(total))
    }

    fn inner_gate(&self, peer_index: u32) -> GateId {
        GateId::new(self.self_node, GateVector::Inner, peer_index, Direction::Out)
    }

    fn producer_gate(&self) -> GateId {
        GateId::new(self.self_node, GateVector::Producer, 0, Direction::Out)
    }

    fn broadcast(&self, exclude: u32, mut make: impl FnMut(NodeId) -> Envelope) -> Vec<Effect<Timer>> {
        self.peer_index
            .iter()
            .filter(|&(_, &idx)| idx != exclude)
            .map(|(&peer, &idx)| Effect::send(self.inner_gate(idx), make(peer)))
            .collect()
    }

    fn broadcast_all(&self, mut make: impl FnMut(NodeId) -> Envelope) -> Vec<Effect<Timer>> {
        self.peer_index
            .iter()
            .map(|(&peer, &idx)| Effect::send(self.inner_gate(idx), make(peer)))
            .collect()
    }

    /// Delivers a completed block body up to this node's own mining driver
    /// via the local producer loopback, and samples propagation delay.
    fn deliver_to_producer(&self, now: SimTime, block: Block) -> Vec<Effect<Timer>> {
        let delay = (now - block.time_mined).as_secs_f64();
        vec![
            Effect::send(
                self.producer_gate(),
                Envelope::block_body(self.self_node, block, 0),
            ),
            Effect::sample("blockDelay", delay),
        ]
    }

    /// Floods a block this node just mined to every peer. Unlike
    /// `on_block_body`/`on_chunk_body`, this never calls
    /// `deliver_to_producer`: the caller (the mining driver or the
    /// HoneyBadger coordinator) already processed the block locally the
    /// instant it was mined, so looping it back through the producer gate
    /// here would have the driver process its own block a second time.
    pub fn on_local_block_mined(&mut self, _now: SimTime, block: Block) -> Vec<Effect<Timer>> {
        let id = block.id();
        let total = self.config.total_chunks;
        self.headers.insert(id, block);
        self.heard.insert(id);
        self.meta.insert(id, BlockMeta::received(total));

        if matches!(self.config.discipline, Discipline::AvailabilityGossip) {
            let have = ChunkMap::full(total);
            self.broadcast_all(|_| Envelope::availability(self.self_node, id, have.clone()))
        } else {
            self.broadcast_all(|_| Envelope::new_block_hash(self.self_node, block))
        }
    }

    pub fn on_envelope(
        &mut self,
        now: SimTime,
        from_index: u32,
        envelope: Envelope,
    ) -> Result<Vec<Effect<Timer>>, SimError> {
        match envelope.kind {
            EnvelopeKind::NewBlockHash { block } => Ok(self.on_new_block_hash(now, from_index, block)),
            EnvelopeKind::GetBlock { block } => Ok(self.on_get_block(from_index, block)),
            EnvelopeKind::BlockBody { block } => Ok(self.on_block_body(now, block)),
            EnvelopeKind::GetChunk { block, chunk } => Ok(self.on_get_chunk(from_index, block, chunk)),
            EnvelopeKind::ChunkBody { block, chunk } => Ok(self.on_chunk_body(now, from_index, block, chunk)),
            EnvelopeKind::Availability { block, have } => Ok(self.on_availability(from_index, block, have)),
            EnvelopeKind::GetBlockChunks { block, chunks } => {
                Ok(self.on_get_block_chunks(from_index, block, chunks))
            }
            // HoneyBadger acks never reach the P2P layer on the sending
            // side (they're addressed straight to the rate limiter); kept
            // here only so this match stays exhaustive over `EnvelopeKind`.
            EnvelopeKind::GotBlock { .. } => Ok(vec![]),
        }
    }

    fn on_new_block_hash(&mut self, now: SimTime, from_index: u32, block: Block) -> Vec<Effect<Timer>> {
        let id = block.id();
        if !self.heard.insert(id) {
            return vec![];
        }
        self.headers.insert(id, block);
        self.meta_entry(id);

        let mut effects = self.broadcast(from_index, |_| Envelope::new_block_hash(self.self_node, block));

        match self.config.discipline {
            Discipline::HashAnnounce => {
                let total = self.config.total_chunks;
                self.meta_entry(id).requested = ChunkMap::full(total);
                effects.push(Effect::send(
                    self.inner_gate(from_index),
                    Envelope::get_block(self.self_node, id),
                ));
            }
            Discipline::ChunkedPull => {
                for chunk in 0..self.config.total_chunks {
                    effects.push(Effect::send(
                        self.inner_gate(from_index),
                        Envelope::get_chunk(self.self_node, id, chunk),
                    ));
                }
            }
            // `AvailabilityGossip` announces via `Availability`, not
            // `NewBlockHash`; a gossip-configured node never sees this
            // envelope kind from a gossip-configured peer.
            Discipline::AvailabilityGossip => {}
        }
        effects
    }

    fn on_get_block(&self, from_index: u32, id: BlockId) -> Vec<Effect<Timer>> {
        let Some(meta) = self.meta.get(&id) else {
            return vec![];
        };
        if !meta.downloaded.is_complete() {
            return vec![];
        }
        let Some(&block) = self.headers.get(&id) else {
            return vec![];
        };
        vec![Effect::send(
            self.inner_gate(from_index),
            Envelope::block_body(self.self_node, block, 0),
        )]
    }

    fn on_block_body(&mut self, now: SimTime, block: Block) -> Vec<Effect<Timer>> {
        let id = block.id();
        let total = self.config.total_chunks;
        self.headers.insert(id, block);
        let meta = self.meta_entry(id);
        if !meta.state.advance(shared_types::BlockState::Received) {
            return vec![];
        }
        meta.downloaded = ChunkMap::full(total);
        self.deliver_to_producer(now, block)
    }

    fn on_get_chunk(&self, from_index: u32, id: BlockId, chunk: u32) -> Vec<Effect<Timer>> {
        let have = self
            .meta
            .get(&id)
            .map(|m| m.downloaded.has(chunk))
            .unwrap_or(false);
        if !have {
            return vec![];
        }
        vec![Effect::send(
            self.inner_gate(from_index),
            Envelope::chunk_body(self.self_node, id, chunk, 0),
        )]
    }

    fn on_chunk_body(&mut self, now: SimTime, from_index: u32, id: BlockId, chunk: u32) -> Vec<Effect<Timer>> {
        let _ = from_index;
        let meta = self.meta_entry(id);
        if !meta.downloaded.set(chunk) {
            return vec![];
        }
        let complete = meta.downloaded.is_complete();
        let have = meta.downloaded.clone();

        let mut effects = vec![];
        if matches!(self.config.discipline, Discipline::AvailabilityGossip) {
            effects.extend(self.broadcast_all(|_| Envelope::availability(self.self_node, id, have.clone())));
            effects.extend(self.arm_fill_step());
        }

        if complete {
            if let Some(&block) = self.headers.get(&id) {
                let meta = self.meta.get_mut(&id).expect("just inserted above");
                if meta.state.advance(shared_types::BlockState::Received) {
                    effects.extend(self.deliver_to_producer(now, block));
                }
            }
        }
        effects
    }

    /// First leg of Discipline C's reconciliation: records what `from_index`
    /// claims to hold, and on the first advertisement for this block,
    /// broadcasts a bulk request for every chunk so every peer starts
    /// tracking this node in its own `peerReq`.
    fn on_availability(&mut self, from_index: u32, id: BlockId, have: ChunkMap) -> Vec<Effect<Timer>> {
        let total = self.config.total_chunks;
        let meta = self.meta_entry(id);
        meta.peer_avail
            .entry(from_index)
            .or_insert_with(|| ChunkMap::empty(total))
            .merge(&have);

        let mut effects = vec![];
        if meta.requested.count() == 0 {
            let all = ChunkMap::full(total);
            meta.requested = all.clone();
            effects.extend(self.broadcast_all(|_| Envelope::get_block_chunks(self.self_node, id, all.clone())));
        }
        effects.extend(self.arm_fill_step());
        effects
    }

    /// Second leg: a peer has asked for `chunks`. Recorded as `peerReq` and
    /// serviced by the next fill step, never answered synchronously here —
    /// that's what lets the fill step apply the egress backpressure cap
    /// across every outstanding request instead of per message.
    fn on_get_block_chunks(&mut self, from_index: u32, id: BlockId, chunks: ChunkMap) -> Vec<Effect<Timer>> {
        let total = self.config.total_chunks;
        let meta = self.meta_entry(id);
        meta.peer_req
            .entry(from_index)
            .or_insert_with(|| ChunkMap::empty(total))
            .merge(&chunks);
        self.arm_fill_step()
    }

    fn arm_fill_step(&mut self) -> Vec<Effect<Timer>> {
        if self.fill_step_armed {
            return vec![];
        }
        self.fill_step_armed = true;
        vec![Effect::schedule(Timer::FillStep, self.config.fill_step_interval)]
    }

    /// `out_queue_len` is this node's current rate-limiter egress-queue
    /// depth, supplied by the runtime so the fill step can back off rather
    /// than pile batched requests onto an already-saturated link.
    pub fn on_timer(&mut self, _now: SimTime, timer: Timer, out_queue_len: usize) -> Vec<Effect<Timer>> {
        match timer {
            Timer::FillStep => self.run_fill_step(out_queue_len),
        }
    }

    /// The chunk holder's push-service loop. Peers are served in descending
    /// index order (biasing service toward higher-capacity peers); for each
    /// peer/block pair the set of chunks still owed is `peerReq & downloaded
    /// & ~peerAvail` — requested, held locally, and not yet known to have
    /// reached that peer. Each chunk pushed updates `peerAvail` optimistically
    /// so a chunk already in flight is never pushed twice while a further
    /// `Availability` confirmation is still outstanding; under packet loss
    /// (not modelled here) that optimism would need a retransmit path.
    ///
    /// `out_queue_len` is this node's current rate-limiter egress-queue
    /// depth; the loop stops emitting the moment the queue would reach
    /// `fill_batch_cap`, deferring the rest to the next fill step.
    fn run_fill_step(&mut self, out_queue_len: usize) -> Vec<Effect<Timer>> {
        let mut effects = vec![];
        let mut budget = self.config.fill_batch_cap.saturating_sub(out_queue_len);

        if budget > 0 {
            let mut indices: Vec<u32> = self.peer_index.values().copied().collect();
            indices.sort_unstable_by(|a, b| b.cmp(a));
            let ids: Vec<BlockId> = self.meta.keys().copied().collect();

            'outer: for peer_idx in indices {
                for &id in &ids {
                    let Some(meta) = self.meta.get(&id) else { continue };
                    let Some(req) = meta.peer_req.get(&peer_idx) else { continue };
                    let total = meta.downloaded.total_chunks();
                    let avail = meta.peer_avail.get(&peer_idx);
                    let mask: Vec<u32> = (0..total)
                        .filter(|&c| {
                            req.has(c) && meta.downloaded.has(c) && !avail.map(|a| a.has(c)).unwrap_or(false)
                        })
                        .take(budget)
                        .collect();
                    if mask.is_empty() {
                        continue;
                    }
                    for &c in &mask {
                        effects.push(Effect::send(
                            self.inner_gate(peer_idx),
                            Envelope::chunk_body(self.self_node, id, c, 0),
                        ));
                    }
                    budget -= mask.len();
                    let meta = self.meta.get_mut(&id).expect("looked up above");
                    let avail = meta.peer_avail.entry(peer_idx).or_insert_with(|| ChunkMap::empty(total));
                    for &c in &mask {
                        avail.set(c);
                    }
                    if budget == 0 {
                        break 'outer;
                    }
                }
            }
        }

        let more_to_do = self.meta.values().any(|meta| {
            meta.peer_req.iter().any(|(idx, req)| {
                let avail = meta.peer_avail.get(idx);
                (0..meta.downloaded.total_chunks())
                    .any(|c| req.has(c) && meta.downloaded.has(c) && !avail.map(|a| a.has(c)).unwrap_or(false))
            })
        });

        if more_to_do {
            effects.push(Effect::schedule(Timer::FillStep, self.config.fill_step_interval));
        } else {
            self.fill_step_armed = false;
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Discipline;
    use shared_types::SimDuration;

    fn block(miner: u32, seq: u64, t: u64) -> Block {
        Block::new(NodeId(miner), seq, seq, SimTime(t))
    }

    #[test]
    fn hash_announce_requests_body_then_delivers_to_producer() {
        let peers = vec![NodeId(1)];
        let mut d = Dissemination::new(NodeId(0), &peers, DisseminationConfig::default());
        let b = block(1, 1, 0);

        let effects = d
            .on_envelope(SimTime::ZERO, 0, Envelope::new_block_hash(NodeId(1), b))
            .unwrap();
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Send { envelope, .. } if matches!(envelope.kind, EnvelopeKind::GetBlock { .. }))));

        let effects = d
            .on_envelope(SimTime(5), 0, Envelope::block_body(NodeId(1), b, 0))
            .unwrap();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Send { to_gate, .. } if to_gate.vector == GateVector::Producer
        )));
        assert_eq!(d.block_meta(b.id()).unwrap().state, shared_types::BlockState::Received);
    }

    #[test]
    fn duplicate_hash_announcement_is_a_no_op() {
        let peers = vec![NodeId(1), NodeId(2)];
        let mut d = Dissemination::new(NodeId(0), &peers, DisseminationConfig::default());
        let b = block(1, 1, 0);
        d.on_envelope(SimTime::ZERO, 0, Envelope::new_block_hash(NodeId(1), b))
            .unwrap();
        let again = d
            .on_envelope(SimTime::ZERO, 0, Envelope::new_block_hash(NodeId(1), b))
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn chunked_pull_completes_after_all_chunks_arrive() {
        let peers = vec![NodeId(1)];
        let mut config = DisseminationConfig::default();
        config.discipline = Discipline::ChunkedPull;
        config.total_chunks = 2;
        let mut d = Dissemination::new(NodeId(0), &peers, config);
        let b = block(1, 1, 0);

        d.on_envelope(SimTime::ZERO, 0, Envelope::new_block_hash(NodeId(1), b))
            .unwrap();
        d.on_envelope(SimTime(1), 0, Envelope::chunk_body(NodeId(1), b.id(), 0, 0))
            .unwrap();
        assert_eq!(d.block_meta(b.id()).unwrap().state, shared_types::BlockState::Learned);
        let effects = d
            .on_envelope(SimTime(2), 0, Envelope::chunk_body(NodeId(1), b.id(), 1, 0))
            .unwrap();
        assert_eq!(d.block_meta(b.id()).unwrap().state, shared_types::BlockState::Received);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Send { to_gate, .. } if to_gate.vector == GateVector::Producer
        )));
    }

    #[test]
    fn fill_step_serves_peer_requests_up_to_the_egress_cap() {
        // Node 0 holds the full block; peer 1 has asked for every chunk.
        // The fill step is the only thing that ever pushes `ChunkBody`, and
        // it must respect `fill_batch_cap` against the live egress depth.
        let peers = vec![NodeId(1)];
        let mut config = DisseminationConfig::default();
        config.discipline = Discipline::AvailabilityGossip;
        config.total_chunks = 4;
        config.fill_batch_cap = 2;
        let mut d = Dissemination::new(NodeId(0), &peers, config);
        let b = block(0, 1, 0);

        d.on_local_block_mined(SimTime::ZERO, b);
        d.on_envelope(
            SimTime::ZERO,
            0,
            Envelope::get_block_chunks(NodeId(1), b.id(), ChunkMap::full(4)),
        )
        .unwrap();

        let saturated = d.on_timer(SimTime(1), Timer::FillStep, 10);
        assert!(!saturated
            .iter()
            .any(|e| matches!(e, Effect::Send { envelope, .. } if matches!(envelope.kind, EnvelopeKind::ChunkBody { .. }))));

        let roomy = d.on_timer(SimTime(2), Timer::FillStep, 0);
        let served = roomy
            .iter()
            .filter(|e| matches!(e, Effect::Send { envelope, .. } if matches!(envelope.kind, EnvelopeKind::ChunkBody { .. })))
            .count();
        assert_eq!(served, 2);
        let _ = SimDuration::ZERO;
    }

    #[test]
    fn availability_gossip_triangle_fans_out_bulk_requests_and_chunks() {
        // N0 mines; N1 and N2 each see its `Availability`, each issues one
        // `GetBlockChunks{ALL}` back, and N0's fill step pushes every chunk
        // to both, peer index 2 ahead of peer index 1 in each burst.
        let peers = vec![NodeId(1), NodeId(2)];
        let mut config = DisseminationConfig::default();
        config.discipline = Discipline::AvailabilityGossip;
        config.total_chunks = 3;
        let mut d = Dissemination::new(NodeId(0), &peers, config);
        let b = block(0, 1, 0);

        let announce = d.on_local_block_mined(SimTime::ZERO, b);
        assert_eq!(
            announce
                .iter()
                .filter(|e| matches!(e, Effect::Send { envelope, .. } if matches!(envelope.kind, EnvelopeKind::Availability { .. })))
                .count(),
            2
        );

        d.on_envelope(
            SimTime::ZERO,
            0,
            Envelope::get_block_chunks(NodeId(1), b.id(), ChunkMap::full(3)),
        )
        .unwrap();
        d.on_envelope(
            SimTime::ZERO,
            1,
            Envelope::get_block_chunks(NodeId(2), b.id(), ChunkMap::full(3)),
        )
        .unwrap();

        let pushed = d.on_timer(SimTime(1), Timer::FillStep, 0);
        let chunk_sends: Vec<(u32, u32)> = pushed
            .iter()
            .filter_map(|e| match e {
                Effect::Send {
                    to_gate,
                    envelope: Envelope {
                        kind: EnvelopeKind::ChunkBody { chunk, .. },
                        ..
                    },
                } => Some((to_gate.index, *chunk)),
                _ => None,
            })
            .collect();
        assert_eq!(chunk_sends.len(), 6);
        let first_peer_2 = chunk_sends.iter().position(|&(idx, _)| idx == 2).unwrap();
        let first_peer_1 = chunk_sends.iter().position(|&(idx, _)| idx == 1).unwrap();
        assert!(first_peer_2 < first_peer_1, "peer index 2 must be served before peer index 1");
    }
}
