//! # Event Kernel
//!
//! A single-threaded discrete-event scheduler. Time only ever advances by
//! popping the next-earliest item off a priority queue; there is no wall
//! clock, no OS thread, and no async runtime anywhere in this crate.

pub mod fabric;
pub mod kernel;
pub mod queue;

pub use fabric::GateFabric;
pub use kernel::{Kernel, KernelEvent, Module, SampleSink};
pub use queue::EventQueue;
