//! Plain Rust config structs for a run, matching the teacher's per-crate
//! `config.rs` convention: `Default` impls plus `serde::Deserialize` so a
//! config *can* be loaded from JSON by a caller, even though this crate
//! never reads one from disk itself — the CLI in `main.rs` only ever builds
//! these from flags.

use honeybadger_epoch::HoneyBadgerConfig;
use mining_driver::MiningConfig;
use p2p_dissemination::DisseminationConfig;
use rate_limiter::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use shared_types::SimDuration;

use crate::topology::Topology;

/// Which block-production process a node runs: one of the three mining
/// modes, or the HoneyBadger epoch coordinator as an alternative to mining
/// entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DriverConfig {
    Mining(MiningConfig),
    HoneyBadger(HoneyBadgerConfig),
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig::Mining(MiningConfig::default())
    }
}

/// Per-node configuration. Every node in a run shares one `NodeConfig`; the
/// simulator has no notion of heterogeneous nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub rate_limiter: RateLimiterConfig,
    pub dissemination: DisseminationConfig,
    pub driver: DriverConfig,
    /// Processing delay for peer-received blocks. `MiningConfig` also
    /// carries its own copy for `mining-driver`'s internal use;
    /// `HoneyBadgerCoordinator::new` takes this as a constructor argument
    /// instead of a config field, so `Node::new` threads it through either
    /// way.
    pub proc_time: SimDuration,
    /// Seed for this run's per-node `StdRng` streams (`mining-driver` XORs
    /// this with the node id, the idiomatic-Rust stand-in for OMNeT++'s
    /// per-module RNG stream).
    pub seed: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rate_limiter: RateLimiterConfig::default(),
            dissemination: DisseminationConfig::default(),
            driver: DriverConfig::default(),
            proc_time: SimDuration::ZERO,
            seed: 0,
        }
    }
}

/// Top-level configuration for one run: the network shape plus the node
/// config every node in it shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub topology: Topology,
    pub node: NodeConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            topology: Topology::FullMesh { n: 4 },
            node: NodeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_config_round_trips_through_json() {
        let config = RunConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.topology, config.topology);
    }
}
