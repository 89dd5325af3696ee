//! HoneyBadgerBFT-style epoch coordinator: an alternative to
//! `mining-driver` where every node mines exactly one block per epoch and
//! the epoch advances once enough nodes have echoed reception of it. Pure
//! domain logic over `shared_types::Effect`; `sim-runtime` is the only
//! place that interprets the effects this crate returns.

mod config;
mod coordinator;
mod timer;

pub use config::HoneyBadgerConfig;
pub use coordinator::HoneyBadgerCoordinator;
pub use timer::Timer;
