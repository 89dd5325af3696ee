//! Gate fabric: the static wiring between nodes' `Outer` gate vectors.
//!
//! The original simulator resolves `gate("peer$o", i)` against a live NED
//! connection graph built at network-setup time. Here the wiring is a
//! plain table built once, validated eagerly, and consulted by the kernel
//! on every `Send` effect.

use shared_types::{Direction, GateId, SimError};
use std::collections::HashMap;

/// A validated, static map from one node's outbound gate to the peer gate
/// it is wired to.
#[derive(Debug, Default, Clone)]
pub struct GateFabric {
    links: HashMap<GateId, GateId>,
}

impl GateFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `a`'s `Out` half to `b`'s `In` half and vice versa. Both gates
    /// must already be in the `Out`/`In` directions matching the physical
    /// link; `connect` does not flip directions for you.
    pub fn connect(&mut self, a: GateId, b: GateId) -> Result<(), SimError> {
        if a.direction == b.direction {
            return Err(SimError::InvariantViolation(format!(
                "cannot connect two gates with the same direction: {a:?} <-> {b:?}"
            )));
        }
        if self.links.insert(a, b).is_some() || self.links.insert(b, a).is_some() {
            return Err(SimError::InvariantViolation(format!(
                "gate already connected: {a:?} or {b:?}"
            )));
        }
        Ok(())
    }

    /// Resolves the peer gate wired to `from`, or an `UnknownGate` error if
    /// nothing was connected to it at construction time.
    pub fn resolve(&self, from: GateId) -> Result<GateId, SimError> {
        self.links
            .get(&from)
            .copied()
            .ok_or_else(|| SimError::UnknownGate(format!("{from:?}")))
    }

    pub fn is_connected(&self, gate: GateId) -> bool {
        self.links.contains_key(&gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{GateVector, NodeId};

    #[test]
    fn connect_is_bidirectional() {
        let mut f = GateFabric::new();
        let out_a = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::Out);
        let in_b = GateId::new(NodeId(1), GateVector::Outer, 0, Direction::In);
        f.connect(out_a, in_b).unwrap();
        assert_eq!(f.resolve(out_a).unwrap(), in_b);
        assert_eq!(f.resolve(in_b).unwrap(), out_a);
    }

    #[test]
    fn unconnected_gate_is_an_error() {
        let f = GateFabric::new();
        let g = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::Out);
        assert!(f.resolve(g).is_err());
    }

    #[test]
    fn same_direction_connect_rejected() {
        let mut f = GateFabric::new();
        let a = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::Out);
        let b = GateId::new(NodeId(1), GateVector::Outer, 0, Direction::Out);
        assert!(f.connect(a, b).is_err());
    }
}
