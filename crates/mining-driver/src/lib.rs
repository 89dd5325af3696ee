//! Per-node block production: three mining disciplines (continuous,
//! round-based, fixed committee) plus the queue that serializes
//! externally-received blocks through a fixed processing delay. Pure
//! domain logic over `shared_types::Effect`; `sim-runtime` is the only
//! place that interprets the effects this crate returns.

mod config;
mod driver;
mod timer;

pub use config::{MiningConfig, MiningMode};
pub use driver::MiningDriver;
pub use timer::Timer;
