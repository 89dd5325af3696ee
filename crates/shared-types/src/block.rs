//! Block identity and the per-node bookkeeping state machine.

use crate::chunk_map::ChunkMap;
use crate::ids::{BlockId, NodeId};
use crate::time::SimTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A block as tracked by the simulator. No transactions, no payload: only
/// the fields that drive propagation and mining-round bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub miner: NodeId,
    pub seq: u64,
    pub height: u64,
    pub time_mined: SimTime,
}

impl Block {
    pub fn new(miner: NodeId, seq: u64, height: u64, time_mined: SimTime) -> Self {
        Self {
            miner,
            seq,
            height,
            time_mined,
        }
    }

    pub fn id(&self) -> BlockId {
        BlockId::new(self.miner, self.seq)
    }
}

/// A node's local knowledge of a block's lifecycle. States only advance
/// forward: `Learned -> Received -> Processed`. Re-observing an earlier
/// state for a block already in a later one is a no-op, never a regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockState {
    /// A hash/announcement for the block has been seen, but no block body.
    Learned,
    /// The full block body (or, under chunking, every chunk) has arrived.
    Received,
    /// The block has been processed by local block-processing logic.
    Processed,
}

impl BlockState {
    /// Advances to `next` if `next` is strictly later in the lifecycle;
    /// otherwise leaves `self` unchanged. Returns whether a transition
    /// occurred.
    pub fn advance(&mut self, next: BlockState) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Per-node, per-block metadata: where a block stands in its lifecycle,
/// which of its chunks have been downloaded and requested, and (under
/// `AvailabilityGossip`) what's known about each peer's own chunk
/// possession and outstanding requests. `downloaded`/`requested` are
/// whole-block bitmaps even under the non-chunked disciplines, where they
/// only ever take the all-or-nothing values `ChunkMap::empty`/`full`.
///
/// Created lazily on first reference to a block id; never destroyed during
/// a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMeta {
    pub state: BlockState,
    pub downloaded: ChunkMap,
    pub requested: ChunkMap,
    /// Peer index -> chunks that peer is known to hold.
    pub peer_avail: HashMap<u32, ChunkMap>,
    /// Peer index -> chunks that peer has asked this node for.
    pub peer_req: HashMap<u32, ChunkMap>,
}

impl BlockMeta {
    pub fn learned(total_chunks: u32) -> Self {
        Self {
            state: BlockState::Learned,
            downloaded: ChunkMap::empty(total_chunks),
            requested: ChunkMap::empty(total_chunks),
            peer_avail: HashMap::new(),
            peer_req: HashMap::new(),
        }
    }

    pub fn received(total_chunks: u32) -> Self {
        Self {
            state: BlockState::Received,
            downloaded: ChunkMap::full(total_chunks),
            requested: ChunkMap::full(total_chunks),
            peer_avail: HashMap::new(),
            peer_req: HashMap::new(),
        }
    }
}
