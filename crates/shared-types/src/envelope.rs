//! The wire envelope exchanged between nodes and carried through the rate
//! limiter. Every message a domain crate wants to send leaves as one of
//! these; the rate limiter only ever looks at `bit_length` and the gate
//! it arrived/departs on, never at `kind`.

use crate::block::Block;
use crate::chunk_map::ChunkMap;
use crate::ids::{BlockId, NodeId};
use serde::{Deserialize, Serialize};

/// Default wire sizes, in bits, used by callers that don't compute an exact
/// payload size. A hash announcement is small and fixed; chunk/availability
/// sizes scale with their content.
pub mod default_size_bits {
    pub const NEW_BLOCK_HASH: u64 = 8 * 40;
    pub const GET_BLOCK: u64 = 8 * 40;
    pub const AVAILABILITY_HEADER: u64 = 8 * 24;
    pub const GET_CHUNK: u64 = 8 * 48;
    pub const GET_BLOCK_CHUNKS_HEADER: u64 = 8 * 24;
    pub const GOT_BLOCK: u64 = 8 * 16;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeKind {
    /// Discipline A/B/C: announce a block's header (miner/seq/height/time
    /// mined) without its body. Carries the full header, not just the id,
    /// so disciplines that fetch the body separately (B, C) still learn
    /// `height`/`time_mined` up front.
    NewBlockHash { block: Block },
    /// Discipline A: request the full block body.
    GetBlock { block: BlockId },
    /// Discipline A: the full block body.
    BlockBody { block: Block },
    /// Discipline B: request one chunk of a block.
    GetChunk { block: BlockId, chunk: u32 },
    /// Discipline B: one chunk of a block's body.
    ChunkBody { block: BlockId, chunk: u32 },
    /// Discipline C: gossip of which chunks of a block a node holds.
    /// Every time the sender's own chunk map grows, this is re-broadcast.
    Availability { block: BlockId, have: ChunkMap },
    /// Discipline C: the receiver of a block's first `Availability` asks
    /// every peer for the chunks named in `chunks`, recording them against
    /// that peer as `peerReq` so the peer's own fill step can service them.
    GetBlockChunks { block: BlockId, chunks: ChunkMap },
    /// HoneyBadger variant: acknowledges that `node` has locally processed
    /// the block mined for `epoch`, broadcast to every peer alongside the
    /// block body itself.
    GotBlock { epoch: u64, node: NodeId },
}

/// A message in flight between two nodes, tagged with its wire size so the
/// rate limiter can schedule it without understanding its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: NodeId,
    pub kind: EnvelopeKind,
    pub bit_length: u64,
}

impl Envelope {
    pub fn new(from: NodeId, kind: EnvelopeKind, bit_length: u64) -> Self {
        Self {
            from,
            kind,
            bit_length,
        }
    }

    pub fn new_block_hash(from: NodeId, block: Block) -> Self {
        Self::new(
            from,
            EnvelopeKind::NewBlockHash { block },
            default_size_bits::NEW_BLOCK_HASH,
        )
    }

    pub fn get_block(from: NodeId, block: BlockId) -> Self {
        Self::new(
            from,
            EnvelopeKind::GetBlock { block },
            default_size_bits::GET_BLOCK,
        )
    }

    pub fn block_body(from: NodeId, block: Block, bit_length: u64) -> Self {
        Self::new(from, EnvelopeKind::BlockBody { block }, bit_length)
    }

    pub fn get_chunk(from: NodeId, block: BlockId, chunk: u32) -> Self {
        Self::new(
            from,
            EnvelopeKind::GetChunk { block, chunk },
            default_size_bits::GET_CHUNK,
        )
    }

    pub fn chunk_body(from: NodeId, block: BlockId, chunk: u32, bit_length: u64) -> Self {
        Self::new(from, EnvelopeKind::ChunkBody { block, chunk }, bit_length)
    }

    pub fn availability(from: NodeId, block: BlockId, have: ChunkMap) -> Self {
        let bits = default_size_bits::AVAILABILITY_HEADER + have.total_chunks() as u64;
        Self::new(from, EnvelopeKind::Availability { block, have }, bits)
    }

    pub fn get_block_chunks(from: NodeId, block: BlockId, chunks: ChunkMap) -> Self {
        let bits = default_size_bits::GET_BLOCK_CHUNKS_HEADER + chunks.total_chunks() as u64;
        Self::new(from, EnvelopeKind::GetBlockChunks { block, chunks }, bits)
    }

    pub fn got_block(from: NodeId, epoch: u64, node: NodeId) -> Self {
        Self::new(
            from,
            EnvelopeKind::GotBlock { epoch, node },
            default_size_bits::GOT_BLOCK,
        )
    }
}
