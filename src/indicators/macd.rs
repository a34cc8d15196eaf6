// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD_t = EMA(fast)_t - EMA(slow)_t, computed per bar over the close series.
// The signal line (EMA of the MACD series itself) is produced by the caller
// with the same recursive smoothing rule; see `compute_frame`.
// =============================================================================

use crate::indicators::ema::ema_series;

/// Compute the MACD series for `closes` with the given fast/slow periods.
///
/// Output is index-aligned 1:1 with the input. Returns an empty vec when
/// either period is zero or the input is empty.
pub fn macd_series(closes: &[f64], fast_period: usize, slow_period: usize) -> Vec<f64> {
    let fast = ema_series(closes, fast_period);
    let slow = ema_series(closes, slow_period);
    if fast.is_empty() || slow.is_empty() {
        return Vec::new();
    }

    fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_empty_input() {
        assert!(macd_series(&[], 12, 26).is_empty());
    }

    #[test]
    fn macd_zero_period() {
        assert!(macd_series(&[1.0, 2.0], 0, 26).is_empty());
        assert!(macd_series(&[1.0, 2.0], 12, 0).is_empty());
    }

    #[test]
    fn macd_is_exact_ema_difference() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let macd = macd_series(&closes, 12, 26);
        let fast = ema_series(&closes, 12);
        let slow = ema_series(&closes, 26);

        assert_eq!(macd.len(), closes.len());
        for i in 0..closes.len() {
            assert!(
                (macd[i] - (fast[i] - slow[i])).abs() < 1e-12,
                "index {i}: {} != {} - {}",
                macd[i],
                fast[i],
                slow[i]
            );
        }
    }

    #[test]
    fn macd_constant_series_is_zero() {
        // Both EMAs sit exactly on a constant series, so their difference
        // is identically zero.
        let closes = vec![250.0; 40];
        for &v in &macd_series(&closes, 12, 26) {
            assert!(v.abs() < 1e-12);
        }
    }
}
