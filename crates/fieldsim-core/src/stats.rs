//! Per-tick summaries.

use serde::{Deserialize, Serialize};

/// Snapshot of the arena after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub tick: u64,
    pub elapsed_s: f64,
    /// Mean speed of the movable bodies on the field, m/s.
    pub mean_speed: f64,
    /// Bodies currently in the world, obstacles included.
    pub live_bodies: usize,
    pub out_of_bounds_len: usize,
    pub hub_len: usize,
    /// Cargo captured by the hub since the start.
    pub scored: usize,
}

/// Mean of `speeds`, or zero when there are none.
pub fn mean(speeds: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = speeds
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert_eq!(mean([1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_summary_serializes() {
        let s = Summary {
            tick: 3,
            scored: 1,
            ..Summary::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"tick\":3"));
        assert!(json.contains("\"scored\":1"));
    }
}
