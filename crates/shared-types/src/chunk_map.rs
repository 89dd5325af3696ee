//! Fixed-size bitmap tracking which chunks of a block a node holds, and
//! which peers are known to hold each chunk (for Discipline B/C availability
//! reconciliation).

use serde::{Deserialize, Serialize};

/// A bitmap over `total` chunks. Used both for "which chunks do I have"
/// and, per peer, "which chunks does this peer have" (availability gossip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMap {
    total: u32,
    bits: Vec<bool>,
}

impl ChunkMap {
    pub fn empty(total: u32) -> Self {
        Self {
            total,
            bits: vec![false; total as usize],
        }
    }

    pub fn full(total: u32) -> Self {
        Self {
            total,
            bits: vec![true; total as usize],
        }
    }

    pub fn total_chunks(&self) -> u32 {
        self.total
    }

    pub fn has(&self, chunk: u32) -> bool {
        self.bits.get(chunk as usize).copied().unwrap_or(false)
    }

    /// Marks `chunk` present. Returns whether this changed the map.
    pub fn set(&mut self, chunk: u32) -> bool {
        match self.bits.get_mut(chunk as usize) {
            Some(b) if !*b => {
                *b = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    pub fn count(&self) -> u32 {
        self.bits.iter().filter(|&&b| b).count() as u32
    }

    /// Chunks present in `other` but missing here.
    pub fn missing_from(&self, other: &ChunkMap) -> Vec<u32> {
        (0..self.total)
            .filter(|&c| !self.has(c) && other.has(c))
            .collect()
    }

    pub fn merge(&mut self, other: &ChunkMap) {
        for c in 0..self.total.min(other.total) {
            if other.has(c) {
                self.set(c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_is_not_complete_until_all_set() {
        let mut m = ChunkMap::empty(4);
        assert!(!m.is_complete());
        for c in 0..4 {
            m.set(c);
        }
        assert!(m.is_complete());
    }

    #[test]
    fn missing_from_reports_only_unheld_present_elsewhere() {
        let mut mine = ChunkMap::empty(4);
        mine.set(0);
        let mut theirs = ChunkMap::empty(4);
        theirs.set(0);
        theirs.set(2);
        theirs.set(3);
        assert_eq!(mine.missing_from(&theirs), vec![2, 3]);
    }

    #[test]
    fn set_reports_whether_it_changed_state() {
        let mut m = ChunkMap::empty(2);
        assert!(m.set(0));
        assert!(!m.set(0));
    }
}
