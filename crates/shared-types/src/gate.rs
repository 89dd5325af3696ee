//! Gate addressing.
//!
//! The original simulator wires modules together with live gate objects
//! (`gate("peer$o", i)`) that a module looks up and sends through directly.
//! Rust has no dynamic "live object" equivalent that is both safe and cheap,
//! so a gate here is a plain, comparable value: a `(node, vector, index,
//! direction)` tuple. The kernel and fabric route by value instead of by
//! pointer-chasing a connection graph at send time.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};

/// Which named gate vector a gate belongs to on its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateVector {
    /// Local producer/consumer loopback (mining driver, epoch coordinator
    /// talking to the node's own P2P state machine).
    Producer,
    /// Inner side of the rate limiter (node-internal, unlimited).
    Inner,
    /// Outer side of the rate limiter (one element per peer link).
    Outer,
}

/// Every OMNeT gate has an input half and an output half; a module writes
/// to `$o` and reads from `$i`. This enum is that half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn flip(self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

/// A fully-addressed gate: which node, which vector, which slot in that
/// vector, and which half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateId {
    pub node: NodeId,
    pub vector: GateVector,
    pub index: u32,
    pub direction: Direction,
}

impl GateId {
    pub fn new(node: NodeId, vector: GateVector, index: u32, direction: Direction) -> Self {
        Self {
            node,
            vector,
            index,
            direction,
        }
    }

    /// The other half of the same gate slot: same node, vector, and index,
    /// opposite direction. This is the Rust stand-in for looking up a
    /// gate's `$i`/`$o` counterpart.
    pub fn mirror(self) -> GateId {
        GateId {
            direction: self.direction.flip(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_flips_direction_only() {
        let g = GateId::new(NodeId(1), GateVector::Outer, 2, Direction::Out);
        let m = g.mirror();
        assert_eq!(m.node, g.node);
        assert_eq!(m.vector, g.vector);
        assert_eq!(m.index, g.index);
        assert_eq!(m.direction, Direction::In);
        assert_eq!(m.mirror(), g);
    }
}
