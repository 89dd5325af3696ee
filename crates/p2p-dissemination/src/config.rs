use serde::{Deserialize, Serialize};
use shared_types::SimDuration;

/// Which of the three block-dissemination disciplines a node runs. All
/// three nodes in a run normally share one discipline; the type itself
/// doesn't enforce that, so a heterogeneous topology is possible too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discipline {
    /// Announce a block's hash; the first peer to ask for the body gets it
    /// whole.
    HashAnnounce,
    /// Announce a block's header; the body is pulled in fixed-size chunks,
    /// one `GetChunk`/`ChunkBody` exchange per chunk.
    ChunkedPull,
    /// Peers gossip which chunks of a block they hold. The first time a
    /// node hears of a block it bulk-requests every chunk from every peer;
    /// each peer then services outstanding requests via a periodic,
    /// rate-aware "fill step" that pushes the chunks it holds to whichever
    /// peers asked for them.
    AvailabilityGossip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisseminationConfig {
    pub discipline: Discipline,
    /// Number of chunks a block's body is split into under `ChunkedPull`
    /// and `AvailabilityGossip`. Unused under `HashAnnounce`.
    pub total_chunks: u32,
    /// How often the `AvailabilityGossip` fill step re-examines missing
    /// chunks against known peer availability.
    pub fill_step_interval: SimDuration,
    /// Upper bound, in outstanding rate-limiter egress-queue entries, on
    /// how many `ChunkBody` sends a single fill step will push. Backpressure:
    /// the fill step stops the moment the node's outgoing queue would reach
    /// this depth, deferring the rest of any peer's outstanding request to
    /// the next tick rather than piling on.
    pub fill_batch_cap: usize,
}

impl Default for DisseminationConfig {
    fn default() -> Self {
        Self {
            discipline: Discipline::HashAnnounce,
            total_chunks: 16,
            fill_step_interval: SimDuration::from_secs_f64(0.1),
            fill_batch_cap: 5_000,
        }
    }
}
