// =============================================================================
// MACD / Signal-line crossover detection with RSI gate
// =============================================================================
//
// An edge detector over the sign of (macd - signal) across the two most
// recent bars, gated by an RSI threshold:
//
//   Call: previous.macd < previous.signal  AND  latest.macd > latest.signal
//         AND  latest.rsi < oversold
//   Put:  previous.macd > previous.signal  AND  latest.macd < latest.signal
//         AND  latest.rsi > overbought
//
// All inequalities are strict: a bar where macd == signal never triggers
// either branch. An undefined RSI at the latest bar means no signal.
// =============================================================================

use crate::indicators::IndicatorRow;
use crate::types::Direction;

/// Classify the latest bar of `frame` as a directional signal.
///
/// Only the last two rows are examined; frames shorter than two rows yield
/// `None`.
pub fn detect(frame: &[IndicatorRow], oversold: f64, overbought: f64) -> Option<Direction> {
    if frame.len() < 2 {
        return None;
    }
    let previous = &frame[frame.len() - 2];
    let latest = &frame[frame.len() - 1];

    let rsi = latest.rsi?;

    let crossed_up = previous.macd < previous.signal && latest.macd > latest.signal;
    if crossed_up && rsi < oversold {
        return Some(Direction::Call);
    }

    let crossed_down = previous.macd > previous.signal && latest.macd < latest.signal;
    if crossed_down && rsi > overbought {
        return Some(Direction::Put);
    }

    None
}
