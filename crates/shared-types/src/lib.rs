//! # Shared Types
//!
//! Domain types shared by every crate in the simulator: node and block
//! identity, virtual time, the gate addressing scheme, the wire envelope,
//! and the `Effect` vocabulary domain crates use to describe scheduling and
//! emission without performing it themselves.
//!
//! No crate in this workspace reads the wall clock or spawns an OS thread;
//! `SimTime`/`SimDuration` are the only notion of time anywhere below
//! `sim-runtime`'s run loop.

pub mod block;
pub mod chunk_map;
pub mod effect;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod ids;
pub mod time;

pub use block::{Block, BlockMeta, BlockState};
pub use chunk_map::ChunkMap;
pub use effect::{Effect, TimerHandle};
pub use envelope::{Envelope, EnvelopeKind};
pub use error::SimError;
pub use gate::{Direction, GateId, GateVector};
pub use ids::{BlockId, NodeId};
pub use time::{SimDuration, SimTime};
