//! Structured logging plus an in-memory stats sink for the simulator's
//! histograms. There is no network exporter here: a batch CLI run has
//! nothing to push traces or metrics to, so this crate is `tracing` (for
//! the run's log output) and a `StatsSink` (for the end-of-run summary)
//! rather than a full observability stack.

mod logging;
mod stats;

pub use logging::init_logging;
pub use stats::{HistogramSummary, InMemoryStatsSink, StatsSink};
