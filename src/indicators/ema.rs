// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The series is seeded with the *first input value* (recursive form, no SMA
// warm-up), so every index of the input has a defined EMA and the output is
// index-aligned 1:1 with the input.
// =============================================================================

/// Compute the EMA series for `values` with look-back `period`.
///
/// Returns a vector the same length as `values`; `out[0] == values[0]`.
///
/// # Edge cases
/// - `period == 0` => empty vec (division-by-zero guard)
/// - empty input => empty vec
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    let mut result = Vec::with_capacity(values.len());
    result.push(values[0]);

    let mut prev = values[0];
    for &value in &values[1..] {
        let ema = value * multiplier + prev * (1.0 - multiplier);
        result.push(ema);
        prev = ema;
    }

    result
}
