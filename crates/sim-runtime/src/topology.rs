//! Small, fixed network shapes built in-process from a node count —
//! deliberately minimal scaffolding to stand up a run, not a general
//! topology-construction subsystem. Mirrors the teacher's practice of
//! validating wiring eagerly at startup (`node-runtime`'s
//! `wiring/core_subsystems.rs`) rather than deferring to first use: gate
//! indices are checked for symmetry before a single `GateFabric::connect`
//! call is made.

use event_kernel::GateFabric;
use serde::{Deserialize, Serialize};
use shared_types::{Direction, GateId, GateVector, NodeId, SimError};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    FullMesh { n: u32 },
    Ring { n: u32 },
    Star { n: u32 },
}

/// The result of building a `Topology`: every node id, each node's ordered
/// peer list (which doubles as that node's `Outer` gate index assignment),
/// and the wired fabric connecting them.
pub struct TopologyPlan {
    pub nodes: Vec<NodeId>,
    pub peers: HashMap<NodeId, Vec<NodeId>>,
    pub fabric: GateFabric,
}

impl Topology {
    pub fn build(&self) -> Result<TopologyPlan, SimError> {
        let (n, peers) = match *self {
            Topology::FullMesh { n } => (n, full_mesh_peers(n)),
            Topology::Ring { n } => (n, ring_peers(n)),
            Topology::Star { n } => (n, star_peers(n)),
        };
        if n == 0 {
            return Err(SimError::InvariantViolation(
                "topology requires at least one node".to_string(),
            ));
        }
        validate_symmetric(&peers)?;

        let nodes: Vec<NodeId> = (0..n).map(NodeId).collect();
        let mut fabric = GateFabric::new();
        let mut wired: std::collections::HashSet<(NodeId, NodeId)> = std::collections::HashSet::new();
        for (&node, list) in &peers {
            for &peer in list {
                let key = (node.min(peer), node.max(peer));
                if !wired.insert(key) {
                    continue;
                }
                let node_idx = index_of(&peers[&node], peer)?;
                let peer_idx = index_of(&peers[&peer], node)?;
                fabric.connect(
                    GateId::new(node, GateVector::Outer, node_idx, Direction::Out),
                    GateId::new(peer, GateVector::Outer, peer_idx, Direction::In),
                )?;
                fabric.connect(
                    GateId::new(peer, GateVector::Outer, peer_idx, Direction::Out),
                    GateId::new(node, GateVector::Outer, node_idx, Direction::In),
                )?;
            }
        }

        Ok(TopologyPlan { nodes, peers, fabric })
    }
}

fn index_of(peers: &[NodeId], node: NodeId) -> Result<u32, SimError> {
    peers
        .iter()
        .position(|&p| p == node)
        .map(|i| i as u32)
        .ok_or_else(|| {
            SimError::InvariantViolation(format!("{node} is not wired as a peer of itself"))
        })
}

/// Every peer relationship must be mutual: if `a` lists `b`, `b` must list
/// `a`. This can never fail for the three builders above, but it is the
/// invariant a future, more general topology constructor would have to
/// uphold, and checking it here keeps the failure at construction time
/// rather than at first delivery.
fn validate_symmetric(peers: &HashMap<NodeId, Vec<NodeId>>) -> Result<(), SimError> {
    for (&node, list) in peers {
        for &peer in list {
            if peer == node {
                return Err(SimError::InvariantViolation(format!(
                    "{node} is wired as its own peer"
                )));
            }
            let reverse_holds = peers.get(&peer).map(|l| l.contains(&node)).unwrap_or(false);
            if !reverse_holds {
                return Err(SimError::InvariantViolation(format!(
                    "{node} lists {peer} as a peer, but not vice versa"
                )));
            }
        }
    }
    Ok(())
}

fn full_mesh_peers(n: u32) -> HashMap<NodeId, Vec<NodeId>> {
    (0..n)
        .map(|i| {
            let list = (0..n).filter(|&j| j != i).map(NodeId).collect();
            (NodeId(i), list)
        })
        .collect()
}

fn ring_peers(n: u32) -> HashMap<NodeId, Vec<NodeId>> {
    (0..n)
        .map(|i| {
            let next = (i + 1) % n;
            let prev = (i + n - 1) % n;
            let list = if n <= 1 {
                vec![]
            } else if n == 2 {
                vec![NodeId(next)]
            } else {
                vec![NodeId(next), NodeId(prev)]
            };
            (NodeId(i), list)
        })
        .collect()
}

fn star_peers(n: u32) -> HashMap<NodeId, Vec<NodeId>> {
    let hub = NodeId(0);
    (0..n)
        .map(|i| {
            let list = if i == 0 {
                (1..n).map(NodeId).collect()
            } else {
                vec![hub]
            };
            (NodeId(i), list)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mesh_wires_every_pair_both_ways() {
        let plan = Topology::FullMesh { n: 4 }.build().unwrap();
        assert_eq!(plan.nodes.len(), 4);
        for &node in &plan.nodes {
            assert_eq!(plan.peers[&node].len(), 3);
        }
        let out = GateId::new(NodeId(0), GateVector::Outer, 0, Direction::Out);
        assert!(plan.fabric.is_connected(out));
    }

    #[test]
    fn ring_gives_every_node_exactly_two_peers() {
        let plan = Topology::Ring { n: 5 }.build().unwrap();
        for &node in &plan.nodes {
            assert_eq!(plan.peers[&node].len(), 2);
        }
    }

    #[test]
    fn star_hub_connects_to_every_leaf_leaves_only_to_hub() {
        let plan = Topology::Star { n: 4 }.build().unwrap();
        assert_eq!(plan.peers[&NodeId(0)].len(), 3);
        assert_eq!(plan.peers[&NodeId(1)], vec![NodeId(0)]);
    }

    #[test]
    fn zero_nodes_is_an_invariant_violation() {
        assert!(Topology::FullMesh { n: 0 }.build().is_err());
    }
}
