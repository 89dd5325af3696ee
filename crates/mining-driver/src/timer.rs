/// This node's own timer vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Fires on the mining process's own schedule (exponential
    /// inter-arrival for `Continuous`, fixed interval otherwise).
    Mine,
    /// Fires `proc_time` after a queued, externally-received block starts
    /// processing.
    ProcessQueue,
}
