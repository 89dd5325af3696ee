//! The event queue: a min-heap ordered by `(virtual time, insertion
//! sequence)`, with insertion sequence as a stable tiebreaker so two events
//! scheduled for the same instant fire in the order they were scheduled.
//!
//! Cancellation is lazy: `cancel` marks a handle as tombstoned; the item
//! stays in the heap and is discarded when it would otherwise be popped.
//! This avoids needing an indexed/decrease-key heap for a fairly rare
//! operation.

use shared_types::{NodeId, SimTime, TimerHandle};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

struct ScheduledItem<E> {
    time: SimTime,
    seq: u64,
    target: NodeId,
    event: E,
}

impl<E> PartialEq for ScheduledItem<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl<E> Eq for ScheduledItem<E> {}

impl<E> PartialOrd for ScheduledItem<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledItem<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, and we want the earliest time
        // (and, within a tie, the lowest sequence number) to pop first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A single delivered item, popped from the queue once its tombstone has
/// been checked.
pub struct Delivery<E> {
    pub time: SimTime,
    pub target: NodeId,
    pub event: E,
}

pub struct EventQueue<E> {
    heap: BinaryHeap<ScheduledItem<E>>,
    cancelled: HashSet<u64>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` for delivery to `target` at `time`, returning a
    /// handle that can later be passed to `cancel`.
    pub fn push(&mut self, time: SimTime, target: NodeId, event: E) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledItem {
            time,
            seq,
            target,
            event,
        });
        TimerHandle(seq)
    }

    /// Tombstones `handle`. A no-op if the handle has already fired or was
    /// already cancelled; the queue has no way to distinguish those cases
    /// without retaining fired sequence numbers forever, so it doesn't try.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.cancelled.insert(handle.0);
    }

    /// Pops and returns the next non-tombstoned item, discarding any
    /// tombstoned items in front of it.
    pub fn pop(&mut self) -> Option<Delivery<E>> {
        loop {
            let item = self.heap.pop()?;
            if self.cancelled.remove(&item.seq) {
                continue;
            }
            return Some(Delivery {
                time: item.time,
                target: item.target,
                event: item.event,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|i| i.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SimDuration;

    #[test]
    fn delivers_in_time_then_insertion_order() {
        let mut q: EventQueue<&'static str> = EventQueue::new();
        q.push(SimTime::ZERO + SimDuration::from_nanos(10), NodeId(0), "b");
        q.push(SimTime::ZERO, NodeId(0), "a");
        q.push(SimTime::ZERO, NodeId(0), "a2");

        assert_eq!(q.pop().unwrap().event, "a");
        assert_eq!(q.pop().unwrap().event, "a2");
        assert_eq!(q.pop().unwrap().event, "b");
        assert!(q.pop().is_none());
    }

    #[test]
    fn cancelled_handle_is_skipped() {
        let mut q: EventQueue<&'static str> = EventQueue::new();
        let h = q.push(SimTime::ZERO, NodeId(0), "gone");
        q.push(SimTime::ZERO, NodeId(0), "stays");
        q.cancel(h);
        assert_eq!(q.pop().unwrap().event, "stays");
        assert!(q.pop().is_none());
    }
}
