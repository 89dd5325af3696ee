use serde::{Deserialize, Serialize};

/// Per-node bandwidth limits, in bits per second. A rate of `0.0` means
/// unlimited: matching envelopes bypass the queue entirely and are sent the
/// instant they arrive, mirroring the original's `if (rate == 0.0) { send
/// immediately }` shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    pub incoming_rate_bps: f64,
    pub outgoing_rate_bps: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            incoming_rate_bps: 0.0,
            outgoing_rate_bps: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        let c = RateLimiterConfig::default();
        assert_eq!(c.incoming_rate_bps, 0.0);
        assert_eq!(c.outgoing_rate_bps, 0.0);
    }
}
