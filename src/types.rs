// =============================================================================
// Shared types used across the Argus option scanner
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Directional outcome of a crossover signal: buy calls or buy puts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Call,
    Put,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// Whether the engine is actively scanning or paused via the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    Active,
    Paused,
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

/// One tradable contract row from an option chain snapshot.
///
/// Field names follow the vendor's camelCase JSON so chain rows deserialize
/// directly. Quotes are fetched fresh per lookup and never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuote {
    #[serde(default)]
    pub contract_symbol: String,
    pub strike: f64,
    #[serde(default)]
    pub last_price: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub ask: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub open_interest: f64,
}

/// Calls and puts for one underlying at one expiry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChain {
    #[serde(default)]
    pub calls: Vec<OptionQuote>,
    #[serde(default)]
    pub puts: Vec<OptionQuote>,
}

/// Terminal artifact of a qualifying ticker: one alert per signal per cycle,
/// handed to the notification sink and retained only in the dashboard ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier for this alert (UUID v4).
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub strike: f64,
    pub expiry: NaiveDate,
    /// Last traded price of the selected contract.
    pub last_price: f64,
    /// Underlying spot price at selection time.
    pub underlying_price: f64,
    /// ISO 8601 timestamp of when this alert was created.
    pub created_at: String,
}

impl Alert {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        strike: f64,
        expiry: NaiveDate,
        last_price: f64,
        underlying_price: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            direction,
            strike,
            expiry,
            last_price,
            underlying_price,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Render the outbound notification message.
    pub fn to_message(&self) -> String {
        format!(
            "📢 **{} ALERT**\nTicker: {}\nStrike: ${}\nExpiry: {}\nLast Price: ${}",
            self.direction, self.symbol, self.strike, self.expiry, self.last_price
        )
    }
}
