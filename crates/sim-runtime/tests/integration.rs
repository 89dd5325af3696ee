//! End-to-end runs against the real event kernel: a full `RunConfig` goes
//! in, a drained/deadline-bounded `Kernel<Node>` comes out, and assertions
//! are made against the resulting histograms and per-node state rather than
//! against any one crate's internals.

use honeybadger_epoch::HoneyBadgerConfig;
use mining_driver::{MiningConfig, MiningMode};
use p2p_dissemination::{Discipline, DisseminationConfig};
use rate_limiter::RateLimiterConfig;
use shared_types::{GateVector, SimDuration, SimTime};
use sim_runtime::{run_until, DriverConfig, NodeConfig, RunConfig, Topology};

fn base_node_config() -> NodeConfig {
    NodeConfig {
        rate_limiter: RateLimiterConfig::default(),
        dissemination: DisseminationConfig::default(),
        driver: DriverConfig::default(),
        proc_time: SimDuration::ZERO,
        seed: 0,
    }
}

#[test]
fn fixed_committee_mines_exactly_committee_size_blocks_per_round() {
    let config = RunConfig {
        topology: Topology::FullMesh { n: 4 },
        node: NodeConfig {
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::FixedCommittee {
                    round_interval: SimDuration::from_secs_f64(1.0),
                    committee_size: 2,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..base_node_config()
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(3.5));
    let report = run_until(&config, deadline).unwrap();

    // Rounds at t=0,1,2,3 each mine exactly 2 blocks (node 0 and node 1 are
    // the committee); every node eventually processes every mined block,
    // so at least 4 rounds * 2 blocks worth of samples should have landed
    // across the fleet.
    let summary = report.summary("blockDelay").expect("some block was mined");
    assert!(summary.count >= 8, "expected at least 8 blockDelay samples, got {}", summary.count);
}

#[test]
fn fixed_committee_outside_the_committee_never_mines() {
    let config = RunConfig {
        topology: Topology::FullMesh { n: 3 },
        node: NodeConfig {
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::FixedCommittee {
                    round_interval: SimDuration::from_secs_f64(1.0),
                    committee_size: 1,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..base_node_config()
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(2.5));
    let report = run_until(&config, deadline).unwrap();

    // Only node 0 ever mines (committee_size = 1), but its blocks still
    // reach nodes 1 and 2 via hash-announce, so every node records
    // blockDelay samples even though only one of them is a miner.
    let summary = report.summary("blockDelay").unwrap();
    assert!(summary.count > 0);
}

#[test]
fn honeybadger_epoch_advances_and_samples_round_interval() {
    let config = RunConfig {
        topology: Topology::FullMesh { n: 4 },
        node: NodeConfig {
            driver: DriverConfig::HoneyBadger(HoneyBadgerConfig { num_nodes: 4 }),
            ..base_node_config()
        },
    };

    // With no rate limiting and a zero-latency fabric, several epochs
    // should complete well within one virtual second.
    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(1.0));
    let report = run_until(&config, deadline).unwrap();

    let summary = report
        .summary("roundInterval")
        .expect("at least one epoch should have completed");
    assert!(summary.count >= 1);
}

#[test]
fn two_node_hash_announce_delivers_a_mined_block_to_its_peer() {
    let config = RunConfig {
        topology: Topology::FullMesh { n: 2 },
        node: NodeConfig {
            dissemination: DisseminationConfig {
                discipline: Discipline::HashAnnounce,
                ..DisseminationConfig::default()
            },
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::FixedCommittee {
                    round_interval: SimDuration::from_secs_f64(1.0),
                    committee_size: 1,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..base_node_config()
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(0.5));
    let report = run_until(&config, deadline).unwrap();

    // Node 0 mines at t=0, node 1 learns the hash and requests the body in
    // the same instant (the fabric has no link latency of its own), so
    // both nodes should have a blockDelay sample by the deadline.
    let node0 = report.stats.node_summary("blockDelay", shared_types::NodeId(0));
    let node1 = report.stats.node_summary("blockDelay", shared_types::NodeId(1));
    assert!(node0.is_some());
    assert!(node1.is_some());
}

#[test]
fn availability_gossip_triangle_delivers_a_mined_block_to_both_peers() {
    // Three nodes fully meshed, node 0 mines: N1 and N2 each see the
    // Availability announce, bulk-request every chunk via GetBlockChunks,
    // and N0's fill step pushes the chunks back through the real rate
    // limiter and event kernel. The per-block-unit push/request mechanics
    // (peer-index-descending service order, the peerReq/peerAvail mask,
    // the optimistic anti-duplication update) are exercised directly
    // against production code in p2p-dissemination's own unit tests; this
    // checks the whole pipeline actually delivers end to end.
    let config = RunConfig {
        topology: Topology::FullMesh { n: 3 },
        node: NodeConfig {
            dissemination: DisseminationConfig {
                discipline: Discipline::AvailabilityGossip,
                total_chunks: 4,
                ..DisseminationConfig::default()
            },
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::FixedCommittee {
                    round_interval: SimDuration::from_secs_f64(1.0),
                    committee_size: 1,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..base_node_config()
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(0.5));
    let report = run_until(&config, deadline).unwrap();

    for node in [shared_types::NodeId(0), shared_types::NodeId(1), shared_types::NodeId(2)] {
        let summary = report.stats.node_summary("blockDelay", node);
        assert!(summary.is_some(), "node {node:?} never completed the block");
    }
}

#[test]
fn rate_limited_outgoing_queue_serves_higher_peer_index_first() {
    // Three-node star with node 0 as the mining hub and a constrained
    // outgoing rate. The descending-peer-index service order itself is
    // asserted directly against production code in rate-limiter's and
    // p2p-dissemination's own unit tests (the ordering lives entirely
    // inside those crates; `RunReport` exposes histogram summaries, not a
    // message trace, so it can't re-derive per-message ordering here).
    // This integration run checks that the full pipeline under
    // constrained bandwidth still completes rather than stalling.
    let config = RunConfig {
        topology: Topology::Star { n: 3 },
        node: NodeConfig {
            rate_limiter: RateLimiterConfig {
                incoming_rate_bps: 0.0,
                outgoing_rate_bps: 1_000.0,
            },
            dissemination: DisseminationConfig {
                discipline: Discipline::HashAnnounce,
                ..DisseminationConfig::default()
            },
            driver: DriverConfig::Mining(MiningConfig {
                mode: MiningMode::FixedCommittee {
                    round_interval: SimDuration::from_secs_f64(1.0),
                    committee_size: 1,
                },
                proc_time: SimDuration::ZERO,
            }),
            ..base_node_config()
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(1.0));
    let report = run_until(&config, deadline).unwrap();
    assert!(report.summary("blockDelay").unwrap().count > 0);
}

#[test]
fn topology_build_validates_before_any_node_is_wired() {
    let config = RunConfig {
        topology: Topology::FullMesh { n: 0 },
        node: base_node_config(),
    };
    assert!(run_until(&config, SimTime::ZERO).is_err());
}

#[test]
fn every_outer_gate_in_a_ring_topology_is_wired() {
    let config = RunConfig {
        topology: Topology::Ring { n: 5 },
        node: base_node_config(),
    };
    let (kernel, plan) = sim_runtime::build_kernel(&config).unwrap();
    for &node in &plan.nodes {
        let peer_count = plan.peers[&node].len() as u32;
        for idx in 0..peer_count {
            let gate = shared_types::GateId::new(node, GateVector::Outer, idx, shared_types::Direction::Out);
            assert!(kernel.module(node).is_some());
            assert!(plan.fabric.is_connected(gate));
        }
    }
}
