//! Collects the samples every domain crate records via
//! `shared_types::Effect::RecordSample` (`blockDelay`, `roundInterval`,
//! queue depths, ...), keyed by histogram name and node. Grounded in the
//! teacher's own use of `parking_lot` to guard shared state behind a plain
//! mutex rather than `std::sync`.

use parking_lot::Mutex;
use shared_types::NodeId;
use std::collections::HashMap;

/// A sink every node hands its samples to. `sim-runtime` wires one
/// `InMemoryStatsSink` per run; tests can swap in their own.
pub trait StatsSink: Send + Sync {
    fn record(&self, histogram: &str, node: NodeId, sample: f64);
}

#[derive(Default)]
pub struct InMemoryStatsSink {
    samples: Mutex<HashMap<String, Vec<f64>>>,
    by_node: Mutex<HashMap<(String, NodeId), Vec<f64>>>,
}

impl InMemoryStatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, histogram: &str) -> Option<HistogramSummary> {
        let samples = self.samples.lock();
        samples.get(histogram).map(|s| HistogramSummary::compute(s))
    }

    pub fn node_summary(&self, histogram: &str, node: NodeId) -> Option<HistogramSummary> {
        let by_node = self.by_node.lock();
        by_node
            .get(&(histogram.to_string(), node))
            .map(|s| HistogramSummary::compute(s))
    }

    pub fn histogram_names(&self) -> Vec<String> {
        self.samples.lock().keys().cloned().collect()
    }
}

impl StatsSink for InMemoryStatsSink {
    fn record(&self, histogram: &str, node: NodeId, sample: f64) {
        self.samples
            .lock()
            .entry(histogram.to_string())
            .or_default()
            .push(sample);
        self.by_node
            .lock()
            .entry((histogram.to_string(), node))
            .or_default()
            .push(sample);
    }
}

/// Summary statistics over one histogram's accumulated samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p99: f64,
}

impl HistogramSummary {
    fn compute(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("samples are never NaN"));
        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();
        Self {
            count,
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            mean: if count == 0 { 0.0 } else { sum / count as f64 },
            p50: percentile(&sorted, 0.50),
            p99: percentile(&sorted, 0.99),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
