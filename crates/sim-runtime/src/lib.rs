//! # Simulation Runtime
//!
//! Topology construction, per-node component composition, and the run loop
//! that drives a `Kernel<Node>` to completion. The binary in `main.rs` is a
//! thin CLI wrapper over what this library exposes.

pub mod config;
pub mod node;
pub mod run;
pub mod topology;

pub use config::{DriverConfig, NodeConfig, RunConfig};
pub use node::{DriverTimer, Node, NodeTimer};
pub use run::{build_kernel, run_to_completion, run_until, RunReport};
pub use topology::{Topology, TopologyPlan};
