//! # P2P Dissemination
//!
//! The three block-dissemination disciplines a node can run: hash-announce
//! with full-block pull, chunked pull, and availability-gossip with a
//! rate-aware fill step. Pure domain logic over `shared_types::Effect`;
//! `sim-runtime` is the only place this crate's effects are interpreted
//! against the real event kernel and rate limiter.

pub mod config;
pub mod dissemination;
pub mod timer;

pub use config::{Discipline, DisseminationConfig};
pub use dissemination::Dissemination;
pub use timer::Timer;
