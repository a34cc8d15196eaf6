// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the momentum indicators used by
// the scanner, plus the per-bar frame that ties them together. Everything is
// recomputed from raw history on every cycle; no indicator state survives
// between scans.

pub mod ema;
pub mod macd;
pub mod rsi;

use serde::Serialize;

use crate::market_data::PriceBar;
use ema::ema_series;
use macd::macd_series;
use rsi::rsi_series;

/// Periods used to build an [`IndicatorRow`] frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub signal_period: usize,
    pub rsi_period: usize,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 26,
            signal_period: 9,
            rsi_period: 14,
        }
    }
}

/// Derived values for one bar, index-aligned 1:1 with the input series.
///
/// `rsi` is `None` while the trailing delta window is incomplete or when the
/// window holds no losses (undefined quotient).
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorRow {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub signal: f64,
    pub rsi: Option<f64>,
}

/// Compute the full indicator frame over `bars`.
///
/// The frame has exactly one row per input bar. Short histories still
/// produce a frame (with an undefined RSI tail/head); rejecting them is the
/// caller's responsibility.
pub fn compute_frame(bars: &[PriceBar], params: &FrameParams) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_fast = ema_series(&closes, params.ema_fast);
    let ema_slow = ema_series(&closes, params.ema_slow);
    let macd = macd_series(&closes, params.ema_fast, params.ema_slow);
    let signal = ema_series(&macd, params.signal_period);
    let rsi = rsi_series(&closes, params.rsi_period);

    if macd.is_empty() || signal.is_empty() {
        return Vec::new();
    }

    (0..closes.len())
        .map(|i| IndicatorRow {
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            macd: macd[i],
            signal: signal[i],
            rsi: rsi[i],
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: 1_700_000_000 + i as i64 * 86_400,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000.0,
            })
            .collect()
    }

    #[test]
    fn frame_is_aligned_with_bars() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.5).cos()).collect();
        let frame = compute_frame(&bars_from_closes(&closes), &FrameParams::default());
        assert_eq!(frame.len(), closes.len());
    }

    #[test]
    fn frame_macd_matches_ema_difference() {
        let closes: Vec<f64> = (0..45).map(|i| 50.0 + i as f64 * 0.3).collect();
        let frame = compute_frame(&bars_from_closes(&closes), &FrameParams::default());
        for row in &frame {
            assert!((row.macd - (row.ema_fast - row.ema_slow)).abs() < 1e-12);
        }
    }

    #[test]
    fn frame_constant_series_has_zero_macd_and_undefined_rsi() {
        let frame = compute_frame(&bars_from_closes(&vec![80.0; 35]), &FrameParams::default());
        for row in &frame {
            assert!(row.macd.abs() < 1e-12);
            assert!(row.signal.abs() < 1e-12);
            assert!(row.rsi.is_none());
        }
    }

    #[test]
    fn frame_empty_input() {
        assert!(compute_frame(&[], &FrameParams::default()).is_empty());
    }
}
