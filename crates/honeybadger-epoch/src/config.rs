use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoneyBadgerConfig {
    /// Fleet size. The epoch-advance quorum is `num_nodes^2`: every node
    /// broadcasts its own block to `num_nodes` peers and every node emits
    /// `num_nodes` `GotBlock` acks.
    pub num_nodes: u32,
}

impl Default for HoneyBadgerConfig {
    fn default() -> Self {
        Self { num_nodes: 4 }
    }
}
