// =============================================================================
// Contract selection — expiry and nearest-the-money strike
// =============================================================================
//
// Expiry: index min(1, last) of the vendor-ordered expiration list, i.e. the
// second-soonest when two or more exist, otherwise the only one. Skipping
// the front expiry avoids same-week theta decay and its thin quotes while
// staying near-term.
//
// Strike: minimum |strike - current_price| over the relevant side of the
// chain; an equidistant tie resolves to the row that appears first in the
// vendor's ordering.
// =============================================================================

use chrono::NaiveDate;

use crate::types::{Direction, OptionChain, OptionQuote};

/// Pick the target expiration from the vendor-ordered list.
///
/// Returns `None` when no expirations exist.
pub fn choose_expiry(expiries: &[NaiveDate]) -> Option<NaiveDate> {
    if expiries.is_empty() {
        return None;
    }
    let idx = 1.min(expiries.len() - 1);
    Some(expiries[idx])
}

/// Select the contract nearest the money on the side matching `direction`.
///
/// Returns `None` when that side of the chain is empty.
pub fn select_contract<'a>(
    chain: &'a OptionChain,
    direction: Direction,
    current_price: f64,
) -> Option<&'a OptionQuote> {
    let side = match direction {
        Direction::Call => &chain.calls,
        Direction::Put => &chain.puts,
    };

    let mut best: Option<(&OptionQuote, f64)> = None;
    for quote in side {
        let distance = (quote.strike - current_price).abs();
        if !distance.is_finite() {
            continue;
        }
        match best {
            // Strict '<' keeps the first row on an exact tie.
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((quote, distance)),
        }
    }

    best.map(|(quote, _)| quote)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quote(symbol: &str, strike: f64) -> OptionQuote {
        OptionQuote {
            contract_symbol: symbol.to_string(),
            strike,
            last_price: 1.0,
            bid: 0.9,
            ask: 1.1,
            volume: 10.0,
            open_interest: 100.0,
        }
    }

    #[test]
    fn expiry_prefers_second_soonest() {
        let expiries = vec![date(2026, 8, 14), date(2026, 8, 21), date(2026, 8, 28)];
        assert_eq!(choose_expiry(&expiries), Some(date(2026, 8, 21)));
    }

    #[test]
    fn expiry_falls_back_to_single_entry() {
        let expiries = vec![date(2026, 8, 14)];
        assert_eq!(choose_expiry(&expiries), Some(date(2026, 8, 14)));
    }

    #[test]
    fn expiry_empty_list() {
        assert_eq!(choose_expiry(&[]), None);
    }

    #[test]
    fn strike_nearest_the_money() {
        let chain = OptionChain {
            calls: vec![quote("c95", 95.0), quote("c100", 100.0), quote("c105", 105.0)],
            puts: Vec::new(),
        };
        let selected = select_contract(&chain, Direction::Call, 101.0).unwrap();
        assert!((selected.strike - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strike_tie_resolves_to_first_in_input_order() {
        // 100 and 104 are equidistant from 102; the earlier row wins.
        let chain = OptionChain {
            calls: vec![quote("c100", 100.0), quote("c104", 104.0)],
            puts: Vec::new(),
        };
        let selected = select_contract(&chain, Direction::Call, 102.0).unwrap();
        assert_eq!(selected.contract_symbol, "c100");

        // Same chain with the rows swapped picks the other contract.
        let chain = OptionChain {
            calls: vec![quote("c104", 104.0), quote("c100", 100.0)],
            puts: Vec::new(),
        };
        let selected = select_contract(&chain, Direction::Call, 102.0).unwrap();
        assert_eq!(selected.contract_symbol, "c104");
    }

    #[test]
    fn put_signal_uses_put_side() {
        let chain = OptionChain {
            calls: vec![quote("c100", 100.0)],
            puts: vec![quote("p90", 90.0), quote("p95", 95.0)],
        };
        let selected = select_contract(&chain, Direction::Put, 96.0).unwrap();
        assert_eq!(selected.contract_symbol, "p95");
    }

    #[test]
    fn empty_side_yields_none() {
        let chain = OptionChain {
            calls: Vec::new(),
            puts: vec![quote("p90", 90.0)],
        };
        assert!(select_contract(&chain, Direction::Call, 100.0).is_none());
    }
}
