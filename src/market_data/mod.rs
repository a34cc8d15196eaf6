// =============================================================================
// Market Data — price bars and provider interfaces
// =============================================================================
//
// The scanner never talks to a data vendor directly. Everything it needs
// (history, spot price, option expiries, option chains, the investable
// universe) comes in through the async traits below, so the orchestrator can
// be exercised in tests with scripted providers and the production Yahoo
// client stays swappable.
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::OptionChain;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar for one equity.
///
/// Bars arrive ordered by strictly increasing `timestamp` (UNIX seconds of
/// the session) and are immutable once retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Provider interfaces
// ---------------------------------------------------------------------------

/// Vendor-neutral market data access for one scan cycle.
///
/// Every call is a single network round-trip with its own timeout; any
/// failure is terminal for the ticker being evaluated (the scan itself
/// continues with the rest of the universe).
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily price history for `symbol` over `range` (e.g. "3mo") at
    /// `interval` (e.g. "1d"). May legitimately return a short series;
    /// the caller enforces the minimum-bar requirement.
    async fn fetch_history(&self, symbol: &str, range: &str, interval: &str)
        -> Result<Vec<PriceBar>>;

    /// Most recent traded price for `symbol`.
    async fn fetch_last_price(&self, symbol: &str) -> Result<f64>;

    /// Option expiration dates for `symbol`, ordered soonest-first as the
    /// vendor returns them.
    async fn fetch_expiries(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// Full option chain (calls and puts) for `symbol` at one expiry.
    async fn fetch_option_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<OptionChain>;
}

/// Resolves the set of tickers worth scanning this cycle.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    /// Tickers whose market capitalization is at or above `threshold` (USD).
    /// Individual lookup failures exclude that ticker, they do not fail the
    /// whole fetch.
    async fn fetch_universe(&self, threshold: f64) -> Result<Vec<String>>;
}
