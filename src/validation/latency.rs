//! Latency sampling and the tail-latency statistic.

use crate::core::error::HarnessResult;
use std::time::Instant;

/// Number of probes the latency stage issues.
pub const SAMPLE_COUNT: usize = 10;

/// Quantile reported by the latency stage.
pub const P95: f64 = 0.95;

/// Value at quantile `q` using the inclusive-rank formula
/// `index = max(0, ceil(q * n) - 1)` over the ascending samples.
///
/// Returns `None` for an empty sample set.
pub fn percentile(samples: &[f64], q: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Latency measurements from one stage invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySamples {
    samples_ms: Vec<f64>,
}

impl LatencySamples {
    /// Call `probe` `count` times in sequence, timing each call in milliseconds.
    ///
    /// The first failing call aborts sampling.
    pub fn collect<F>(count: usize, mut probe: F) -> HarnessResult<Self>
    where
        F: FnMut() -> HarnessResult<()>,
    {
        let mut samples_ms = Vec::with_capacity(count);
        for _ in 0..count {
            let start = Instant::now();
            probe()?;
            samples_ms.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(Self { samples_ms })
    }

    /// Wrap already-measured samples.
    pub fn from_millis(samples_ms: Vec<f64>) -> Self {
        Self { samples_ms }
    }

    /// Samples in measurement order.
    pub fn as_millis(&self) -> &[f64] {
        &self.samples_ms
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples_ms.len()
    }

    /// Whether no samples were taken.
    pub fn is_empty(&self) -> bool {
        self.samples_ms.is_empty()
    }

    /// 95th-percentile latency.
    pub fn p95(&self) -> Option<f64> {
        percentile(&self.samples_ms, P95)
    }
}
