//! CLI entry point: builds a `RunConfig` from flags, runs the simulator to
//! completion, and prints the end-of-run histogram summaries. A plain
//! synchronous `fn main` — no `tokio` runtime anywhere in this crate or
//! below it; the kernel is a single-threaded, virtual-time-only scheduler.

use clap::Parser;
use honeybadger_epoch::HoneyBadgerConfig;
use mining_driver::{MiningConfig, MiningMode};
use p2p_dissemination::{Discipline, DisseminationConfig};
use rate_limiter::RateLimiterConfig;
use shared_types::{SimDuration, SimTime};
use sim_runtime::{run_until, DriverConfig, NodeConfig, RunConfig, Topology};
use tracing::info;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TopologyKind {
    FullMesh,
    Ring,
    Star,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum MiningModeKind {
    Continuous,
    Round,
    FixedCommittee,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DisciplineKind {
    HashAnnounce,
    ChunkedPull,
    AvailabilityGossip,
}

/// Discrete-event simulator of blockchain block-dissemination protocols over
/// a bandwidth-limited peer-to-peer network.
#[derive(Parser, Debug)]
#[command(name = "sim-runtime")]
#[command(about = "Discrete-event simulator of blockchain block-dissemination protocols")]
struct Args {
    /// Network shape.
    #[arg(long, value_enum, default_value = "full-mesh")]
    topology: TopologyKind,

    /// Fleet size.
    #[arg(long, default_value_t = 4)]
    nodes: u32,

    /// Run the HoneyBadger epoch coordinator instead of a mining mode.
    #[arg(long)]
    honeybadger: bool,

    #[arg(long, value_enum, default_value = "continuous")]
    mining_mode: MiningModeKind,

    /// Mean blocks/second (Continuous), or Poisson mean rate (Round).
    #[arg(long, default_value_t = 1.0)]
    mining_rate: f64,

    /// Round length in seconds (Round / FixedCommittee modes).
    #[arg(long, default_value_t = 1.0)]
    round_interval: f64,

    /// Committee size for FixedCommittee mode (the first N node ids mine).
    #[arg(long, default_value_t = 0)]
    committee_size: u32,

    /// Per-block CPU delay applied to peer-received blocks, in seconds.
    #[arg(long, default_value_t = 0.0)]
    proc_time: f64,

    /// Ingress shaping rate in bits/second. 0 disables shaping.
    #[arg(long, default_value_t = 0.0)]
    incoming_rate: f64,

    /// Egress shaping rate in bits/second. 0 disables shaping.
    #[arg(long, default_value_t = 0.0)]
    outgoing_rate: f64,

    #[arg(long, value_enum, default_value = "hash-announce")]
    discipline: DisciplineKind,

    /// Chunks per block body (ChunkedPull / AvailabilityGossip disciplines).
    #[arg(long, default_value_t = 16)]
    total_chunks: u32,

    /// RNG seed for this run's per-node streams.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// How much virtual time to simulate, in seconds. Every driver mode
    /// self-reschedules forever, so a run never drains on its own and must
    /// be cut off at a deadline.
    #[arg(long, default_value_t = 60.0)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    sim_telemetry::init_logging();
    let args = Args::parse();

    let topology = match args.topology {
        TopologyKind::FullMesh => Topology::FullMesh { n: args.nodes },
        TopologyKind::Ring => Topology::Ring { n: args.nodes },
        TopologyKind::Star => Topology::Star { n: args.nodes },
    };

    let proc_time = SimDuration::from_secs_f64(args.proc_time);
    let driver = if args.honeybadger {
        DriverConfig::HoneyBadger(HoneyBadgerConfig {
            num_nodes: args.nodes,
        })
    } else {
        let mode = match args.mining_mode {
            MiningModeKind::Continuous => MiningMode::Continuous {
                mining_rate_per_sec: args.mining_rate,
            },
            MiningModeKind::Round => MiningMode::Round {
                round_interval: SimDuration::from_secs_f64(args.round_interval),
                mining_rate_per_sec: args.mining_rate,
            },
            MiningModeKind::FixedCommittee => MiningMode::FixedCommittee {
                round_interval: SimDuration::from_secs_f64(args.round_interval),
                committee_size: args.committee_size,
            },
        };
        DriverConfig::Mining(MiningConfig { mode, proc_time })
    };

    let discipline = match args.discipline {
        DisciplineKind::HashAnnounce => Discipline::HashAnnounce,
        DisciplineKind::ChunkedPull => Discipline::ChunkedPull,
        DisciplineKind::AvailabilityGossip => Discipline::AvailabilityGossip,
    };

    let config = RunConfig {
        topology,
        node: NodeConfig {
            rate_limiter: RateLimiterConfig {
                incoming_rate_bps: args.incoming_rate,
                outgoing_rate_bps: args.outgoing_rate,
            },
            dissemination: DisseminationConfig {
                discipline,
                total_chunks: args.total_chunks,
                ..DisseminationConfig::default()
            },
            driver,
            proc_time,
            seed: args.seed,
        },
    };

    let deadline = SimTime::ZERO.saturating_add(SimDuration::from_secs_f64(args.duration));
    info!(nodes = args.nodes, honeybadger = args.honeybadger, duration = args.duration, "starting run");
    let report = run_until(&config, deadline)?;

    for histogram in ["blockDelay", "roundInterval"] {
        match report.summary(histogram) {
            Some(summary) => println!(
                "{histogram}: count={} mean={:.6} p50={:.6} p99={:.6} min={:.6} max={:.6}",
                summary.count, summary.mean, summary.p50, summary.p99, summary.min, summary.max
            ),
            None => println!("{histogram}: no samples"),
        }
    }

    Ok(())
}
