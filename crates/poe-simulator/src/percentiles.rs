//! # Nearest-Rank Percentiles
//!
//! Latency aggregation uses nearest-rank selection over sorted samples:
//! the p-th percentile of n samples is the value at rank
//! `ceil(p / 100 * n)` (1-based). No interpolation.
//!
//! An empty sample set yields 0.0 for every percentile. This is an
//! explicit policy: a node the simulator never timed has no distribution,
//! and reporting zero beats indexing out of bounds.

use poe_core::LatencyStats;

/// Nearest-rank percentile over an already-sorted sample slice.
///
/// Returns 0.0 for an empty slice. `pct` outside (0, 100] is clamped via
/// the rank bounds.
pub fn nearest_rank(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = ((pct / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Compute the p50/p90/p95/p99 stats for a set of latency samples.
///
/// Sorts a copy of the samples; the input order does not matter.
pub fn latency_stats(samples: &[f64]) -> LatencyStats {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    LatencyStats {
        p50: nearest_rank(&sorted, 50.0),
        p90: nearest_rank(&sorted, 90.0),
        p95: nearest_rank(&sorted, 95.0),
        p99: nearest_rank(&sorted, 99.0),
    }
}
