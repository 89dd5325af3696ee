//! # Rate Limiter
//!
//! Per-node ingress/egress bandwidth shaping between a node's own logic
//! (`Inner` gates) and its peer links (`Outer` gates), grounded on the
//! original `NodeRateLimiter` OMNeT++ module. Pure domain logic: this
//! crate never touches the event kernel directly.

pub mod config;
pub mod limiter;

pub use config::RateLimiterConfig;
pub use limiter::{NodeRateLimiter, Timer};
