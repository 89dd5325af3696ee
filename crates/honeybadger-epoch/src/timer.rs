/// This node's own timer vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Fires to start the next epoch: mine exactly one block and
    /// broadcast it plus a `GotBlock` ack.
    Mine,
    /// Fires `proc_time` after a queued, peer-sourced block starts
    /// processing.
    ProcessQueue,
}
