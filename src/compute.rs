//! Synthetic compute (component C1): a load-bearing busy-wait standing in
//! for the transport sweep kernel. The benchmark measures communication
//! and synchronization overhead, not flux physics, so this deliberately
//! does no useful work.

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Default per-cell compute duration, used when `LOAD` is unset.
pub const DEFAULT_LOAD: Duration = Duration::from_nanos(100);

/// Reads the `LOAD` environment variable (seconds, floating point) and
/// returns the corresponding [`Duration`], falling back to
/// [`DEFAULT_LOAD`] if it is unset or unparsable.
pub fn load_from_env() -> Duration {
    std::env::var("LOAD")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(DEFAULT_LOAD)
}

/// Burns approximately `load` of wall-clock time. Called once per angle,
/// per chunk cell, per group.
pub fn compute(load: Duration) {
    if load.is_zero() {
        return;
    }
    let start = Instant::now();
    let mut x = 0.0_f64;
    while start.elapsed() < load {
        x = black_box(x + 1.0);
    }
    black_box(x);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_burns_at_least_the_requested_duration() {
        let load = Duration::from_millis(2);
        let start = Instant::now();
        compute(load);
        assert!(start.elapsed() >= load);
    }

    #[test]
    fn zero_load_returns_immediately() {
        let start = Instant::now();
        compute(Duration::ZERO);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn default_load_is_small() {
        assert!(DEFAULT_LOAD < Duration::from_micros(1));
    }
}
