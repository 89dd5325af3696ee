use serde::{Deserialize, Serialize};
use shared_types::SimDuration;

/// Which of the three mining processes a node runs, grounded on the
/// original `Miner` module's docstring: continuous mode mimics PoW,
/// round mode mimics PoS, fixed-committee mode mimics a rotating
/// permissioned validator set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MiningMode {
    /// Blocks arrive at independent, exponentially-distributed intervals
    /// with the given per-node rate (blocks/second).
    Continuous { mining_rate_per_sec: f64 },
    /// Once per `round_interval`, draw a Poisson-distributed number of
    /// blocks (mean `round_interval * mining_rate_per_sec`) and mine that
    /// many.
    Round {
        round_interval: SimDuration,
        mining_rate_per_sec: f64,
    },
    /// Once per `round_interval`, mine exactly one block if this node's
    /// index is below `committee_size`, else none.
    FixedCommittee {
        round_interval: SimDuration,
        committee_size: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    pub mode: MiningMode,
    /// Time to locally process one externally-received block before the
    /// next one in the queue can be processed.
    pub proc_time: SimDuration,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            mode: MiningMode::Continuous {
                mining_rate_per_sec: 1.0,
            },
            proc_time: SimDuration::ZERO,
        }
    }
}
