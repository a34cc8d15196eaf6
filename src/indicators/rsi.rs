// =============================================================================
// Relative Strength Index (RSI) — trailing simple-mean variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Average gain / average loss = plain trailing mean over the last
//          `period` deltas (a rolling window, NOT Wilder smoothing).
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The value is undefined (`None`) for the first `period` bars (not enough
// deltas) and whenever avg_loss == 0 (the RS quotient has no meaning).
// Callers must treat both as "no signal derivable".
//
// Thresholds:  RSI > 70 => overbought,  RSI < 30 => oversold.
// =============================================================================

/// Compute the RSI series for `closes` with look-back `period`.
///
/// The output is index-aligned 1:1 with the input: `out[i]` is `Some` only
/// when `i >= period` and the trailing window contains at least one losing
/// delta.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - every defined value lies in [0, 100]
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut result = vec![None; closes.len()];
    for i in period..closes.len() {
        // Last `period` deltas ending at bar i: deltas[i-period .. i].
        let window = &deltas[i - period..i];

        let (sum_gain, sum_loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });

        let avg_gain = sum_gain / period as f64;
        let avg_loss = sum_loss / period as f64;

        if avg_loss == 0.0 {
            continue; // undefined — division by zero
        }

        let rs = avg_gain / avg_loss;
        result[i] = Some(100.0 - 100.0 / (1.0 + rs));
    }

    result
}
