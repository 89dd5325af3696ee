//! Wires a `RunConfig` into a `Kernel<Node>` and drives it to completion,
//! collecting samples into an `InMemoryStatsSink`. This is the library-level
//! entry point `main.rs`'s CLI calls; kept separate from `main` so
//! integration tests can drive a run without going through the CLI.

use event_kernel::Kernel;
use shared_types::{NodeId, SimError, SimTime};
use sim_telemetry::{HistogramSummary, InMemoryStatsSink};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::node::Node;
use crate::topology::TopologyPlan;

pub fn build_kernel(config: &RunConfig) -> Result<(Kernel<Node>, TopologyPlan), SimError> {
    let plan = config.topology.build()?;
    let mut kernel = Kernel::new(plan.fabric.clone());
    for &node_id in &plan.nodes {
        let peers = &plan.peers[&node_id];
        let module = Node::new(node_id, peers, config.node.clone());
        kernel.insert_module(node_id, module);
    }
    Ok((kernel, plan))
}

pub struct RunReport {
    pub plan: TopologyPlan,
    pub stats: Arc<InMemoryStatsSink>,
}

impl RunReport {
    pub fn summary(&self, histogram: &str) -> Option<HistogramSummary> {
        self.stats.summary(histogram)
    }
}

fn start_nodes(
    kernel: &mut Kernel<Node>,
    plan: &TopologyPlan,
    sample_sink: &mut impl FnMut(NodeId, &str, f64),
) -> Result<(), SimError> {
    for &node_id in &plan.nodes {
        let effects = kernel
            .module_mut(node_id)
            .expect("just inserted into the kernel")
            .start();
        kernel.apply_effects(node_id, effects, sample_sink)?;
    }
    Ok(())
}

/// Builds a kernel from `config`, arms every node's first mining/epoch
/// timer, and runs until the event queue drains.
///
/// Every driver in this crate self-reschedules its next `Mine`/epoch timer
/// indefinitely, so a `config` built around a mining or HoneyBadger driver
/// never drains on its own and this never returns. It exists for
/// topologies and tests built around modules that do eventually go idle;
/// callers running an open-ended driver want [`run_until`] instead.
pub fn run_to_completion(config: &RunConfig) -> Result<RunReport, SimError> {
    let (mut kernel, plan) = build_kernel(config)?;
    let stats = Arc::new(InMemoryStatsSink::new());
    let mut sample_sink = {
        let stats = stats.clone();
        move |node: NodeId, histogram: &str, sample: f64| stats.record(histogram, node, sample)
    };

    start_nodes(&mut kernel, &plan, &mut sample_sink)?;
    kernel.run_to_completion(&mut sample_sink)?;

    Ok(RunReport { plan, stats })
}

/// Builds a kernel from `config`, arms every node's first mining/epoch
/// timer, and runs up to and including `deadline`. The intended entry
/// point for any run whose driver keeps rescheduling itself forever, which
/// in practice is every mining mode and the HoneyBadger coordinator.
pub fn run_until(config: &RunConfig, deadline: SimTime) -> Result<RunReport, SimError> {
    let (mut kernel, plan) = build_kernel(config)?;
    let stats = Arc::new(InMemoryStatsSink::new());
    let mut sample_sink = {
        let stats = stats.clone();
        move |node: NodeId, histogram: &str, sample: f64| stats.record(histogram, node, sample)
    };

    start_nodes(&mut kernel, &plan, &mut sample_sink)?;
    kernel.run_until(deadline, &mut sample_sink)?;

    Ok(RunReport { plan, stats })
}
