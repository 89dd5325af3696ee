/// This node's own timer vocabulary. Only `AvailabilityGossip` uses one;
/// `HashAnnounce` and `ChunkedPull` are purely reactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    FillStep,
}
