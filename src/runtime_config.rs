// =============================================================================
// Runtime Configuration — Hot-reloadable scanner settings with atomic save
// =============================================================================
//
// Central configuration hub for the Argus scanner.  Every tunable parameter
// lives here so that the engine can be reconfigured at runtime without a
// restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::ScanMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_candidate_symbols() -> Vec<String> {
    [
        "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AVGO", "JPM", "UNH",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_market_cap_threshold() -> f64 {
    50e9
}

fn default_scan_interval_hours() -> u64 {
    4
}

fn default_history_range() -> String {
    "3mo".to_string()
}

fn default_history_interval() -> String {
    "1d".to_string()
}

fn default_min_history_bars() -> usize {
    30
}

fn default_max_concurrent_scans() -> usize {
    4
}

fn default_ema_fast() -> usize {
    12
}

fn default_ema_slow() -> usize {
    26
}

fn default_signal_period() -> usize {
    9
}

fn default_rsi_period() -> usize {
    14
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

// =============================================================================
// ScannerParams
// =============================================================================

/// Tunable parameters for the signal pipeline (indicator periods, RSI gates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerParams {
    /// Fast EMA period for the MACD line.
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,

    /// Slow EMA period for the MACD line.
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,

    /// EMA period of the MACD signal line.
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,

    /// RSI look-back window.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// RSI below this confirms a bullish crossover.
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    /// RSI above this confirms a bearish crossover.
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,
}

impl Default for ScannerParams {
    fn default() -> Self {
        Self {
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            signal_period: default_signal_period(),
            rsi_period: default_rsi_period(),
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Argus scanner.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Operational mode ----------------------------------------------------

    /// Whether scheduled scans run or are skipped.
    #[serde(default)]
    pub scan_mode: ScanMode,

    // --- Universe ------------------------------------------------------------

    /// Candidate tickers considered for the universe each cycle. The universe
    /// provider filters these by market capitalization.
    #[serde(default = "default_candidate_symbols")]
    pub candidate_symbols: Vec<String>,

    /// Minimum market capitalization (USD) for a candidate to enter the
    /// universe.
    #[serde(default = "default_market_cap_threshold")]
    pub market_cap_threshold: f64,

    // --- Scheduling & data window -------------------------------------------

    /// Hours between scheduled scans.
    #[serde(default = "default_scan_interval_hours")]
    pub scan_interval_hours: u64,

    /// History lookback passed to the data vendor (e.g. "3mo").
    #[serde(default = "default_history_range")]
    pub history_range: String,

    /// Bar interval passed to the data vendor (e.g. "1d").
    #[serde(default = "default_history_interval")]
    pub history_interval: String,

    /// Minimum number of bars required before indicators are computed.
    #[serde(default = "default_min_history_bars")]
    pub min_history_bars: usize,

    /// Upper bound on tickers evaluated concurrently within one scan.
    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,

    // --- Signal pipeline -----------------------------------------------------

    /// Indicator periods and RSI confirmation gates.
    #[serde(default)]
    pub scanner_params: ScannerParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::Active,
            candidate_symbols: default_candidate_symbols(),
            market_cap_threshold: default_market_cap_threshold(),
            scan_interval_hours: default_scan_interval_hours(),
            history_range: default_history_range(),
            history_interval: default_history_interval(),
            min_history_bars: default_min_history_bars(),
            max_concurrent_scans: default_max_concurrent_scans(),
            scanner_params: ScannerParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            candidates = config.candidate_symbols.len(),
            scan_mode = %config.scan_mode,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
