// =============================================================================
// Scan Orchestrator — The Brain of Argus
// =============================================================================
//
// Runs one full scan cycle over the resolved universe.
//
// Pipeline per ticker:
//   1. Fetch daily history (3 months)
//   2. Reject series shorter than the minimum bar count
//   3. Compute the indicator frame (EMA fast/slow, MACD, signal line, RSI)
//   4. Detect a crossover signal from the last two rows
//   5. On signal: fetch spot price, expiries, and the chain at the chosen
//      expiry; select the strike nearest the money
//   6. Build an Alert and hand it to the notification sink
//
// Tickers are evaluated concurrently up to `max_concurrent_scans`; results
// drain through a single consumer loop, which also serializes access to the
// notification sink. A failure anywhere in a ticker's pipeline skips that
// ticker with a recorded reason and never aborts the rest of the scan.
// =============================================================================

use std::sync::Arc;

use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::indicators::{compute_frame, FrameParams};
use crate::market_data::{MarketDataProvider, UniverseProvider};
use crate::notify::NotificationSink;
use crate::options::{choose_expiry, select_contract};
use crate::signals::detect;
use crate::types::Alert;

// =============================================================================
// Per-ticker outcome
// =============================================================================

/// Why a ticker was dropped from the current cycle.
///
/// An undefined indicator at the latest bar is *not* a skip — it simply
/// yields no signal.
#[derive(Debug, Clone)]
pub enum SkipReason {
    HistoryUnavailable(String),
    InsufficientHistory { got: usize, need: usize },
    PriceUnavailable(String),
    ChainUnavailable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HistoryUnavailable(e) => write!(f, "history unavailable: {e}"),
            Self::InsufficientHistory { got, need } => {
                write!(f, "insufficient history: {got} < {need} bars")
            }
            Self::PriceUnavailable(e) => write!(f, "price unavailable: {e}"),
            Self::ChainUnavailable(e) => write!(f, "option chain unavailable: {e}"),
        }
    }
}

/// A ticker excluded from the cycle, with its reason, for the cycle report.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTicker {
    pub symbol: String,
    pub reason: String,
}

// =============================================================================
// Cycle report
// =============================================================================

/// Aggregate outcome of one scan cycle, kept in shared state and served by
/// the dashboard API.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// ISO 8601 timestamp of when the cycle started.
    pub started_at: String,
    pub duration_ms: u64,
    /// Tickers in the resolved universe this cycle.
    pub universe_size: usize,
    pub alerts: Vec<Alert>,
    /// Tickers that evaluated cleanly but produced no signal.
    pub no_signal: usize,
    pub skipped: Vec<SkippedTicker>,
    pub notified: usize,
    pub notify_failures: usize,
}

impl ScanReport {
    fn started(universe_size: usize) -> Self {
        Self {
            started_at: Utc::now().to_rfc3339(),
            duration_ms: 0,
            universe_size,
            alerts: Vec::new(),
            no_signal: 0,
            skipped: Vec::new(),
            notified: 0,
            notify_failures: 0,
        }
    }
}

// =============================================================================
// Scan Engine
// =============================================================================

pub struct ScanEngine {
    state: Arc<AppState>,
    market: Arc<dyn MarketDataProvider>,
    universe: Arc<dyn UniverseProvider>,
    sink: Arc<dyn NotificationSink>,
}

impl ScanEngine {
    pub fn new(
        state: Arc<AppState>,
        market: Arc<dyn MarketDataProvider>,
        universe: Arc<dyn UniverseProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            state,
            market,
            universe,
            sink,
        }
    }

    /// Run one full scan cycle and store the report in shared state.
    pub async fn run_scan(&self) -> ScanReport {
        let started = std::time::Instant::now();

        let (threshold, max_concurrent) = {
            let config = self.state.runtime_config.read();
            (config.market_cap_threshold, config.max_concurrent_scans.max(1))
        };

        let symbols = match self.universe.fetch_universe(threshold).await {
            Ok(symbols) => symbols,
            Err(e) => {
                error!(error = %e, "universe fetch failed, skipping cycle");
                self.state.record_error(format!("universe fetch failed: {e}"));
                return self.finish(ScanReport::started(0), started);
            }
        };
        if symbols.is_empty() {
            warn!("universe is empty, nothing to scan");
        }

        info!(universe = symbols.len(), "scan cycle started");
        let mut report = ScanReport::started(symbols.len());

        let mut outcomes = stream::iter(symbols)
            .map(|symbol| async move {
                let outcome = self.evaluate_symbol(&symbol).await;
                (symbol, outcome)
            })
            .buffer_unordered(max_concurrent);

        // Single consumer loop: sink access is serialized here.
        while let Some((symbol, outcome)) = outcomes.next().await {
            match outcome {
                Ok(Some(alert)) => {
                    match self.sink.notify(&alert.to_message()).await {
                        Ok(()) => report.notified += 1,
                        Err(e) => {
                            warn!(symbol = %alert.symbol, error = %e, "notification delivery failed");
                            self.state
                                .record_error(format!("notify {}: {e}", alert.symbol));
                            report.notify_failures += 1;
                        }
                    }
                    self.state.push_alert(alert.clone());
                    report.alerts.push(alert);
                }
                Ok(None) => report.no_signal += 1,
                Err(reason) => {
                    debug!(symbol = %symbol, reason = %reason, "ticker skipped");
                    report.skipped.push(SkippedTicker {
                        symbol,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        self.finish(report, started)
    }

    fn finish(&self, mut report: ScanReport, started: std::time::Instant) -> ScanReport {
        report.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            universe = report.universe_size,
            alerts = report.alerts.len(),
            no_signal = report.no_signal,
            skipped = report.skipped.len(),
            notified = report.notified,
            notify_failures = report.notify_failures,
            duration_ms = report.duration_ms,
            "scan cycle complete"
        );

        *self.state.last_report.write() = Some(report.clone());
        self.state.increment_version();
        report
    }

    /// Evaluate a single ticker end to end.
    ///
    /// `Ok(None)` means the ticker evaluated cleanly but produced no signal
    /// (including an undefined RSI at the latest bar). `Err` carries the
    /// skip reason for the cycle report.
    async fn evaluate_symbol(&self, symbol: &str) -> Result<Option<Alert>, SkipReason> {
        let (range, interval, min_bars, params, oversold, overbought) = {
            let config = self.state.runtime_config.read();
            let sp = &config.scanner_params;
            (
                config.history_range.clone(),
                config.history_interval.clone(),
                config.min_history_bars,
                FrameParams {
                    ema_fast: sp.ema_fast,
                    ema_slow: sp.ema_slow,
                    signal_period: sp.signal_period,
                    rsi_period: sp.rsi_period,
                },
                sp.rsi_oversold,
                sp.rsi_overbought,
            )
        };

        let bars = self
            .market
            .fetch_history(symbol, &range, &interval)
            .await
            .map_err(|e| SkipReason::HistoryUnavailable(e.to_string()))?;

        if bars.len() < min_bars {
            return Err(SkipReason::InsufficientHistory {
                got: bars.len(),
                need: min_bars,
            });
        }

        let frame = compute_frame(&bars, &params);
        let direction = match detect(&frame, oversold, overbought) {
            Some(direction) => direction,
            None => return Ok(None),
        };

        info!(symbol, direction = %direction, "crossover signal detected");

        let price = self
            .market
            .fetch_last_price(symbol)
            .await
            .map_err(|e| SkipReason::PriceUnavailable(e.to_string()))?;

        let expiries = self
            .market
            .fetch_expiries(symbol)
            .await
            .map_err(|e| SkipReason::ChainUnavailable(e.to_string()))?;

        let expiry = choose_expiry(&expiries)
            .ok_or_else(|| SkipReason::ChainUnavailable("no expirations listed".to_string()))?;

        let chain = self
            .market
            .fetch_option_chain(symbol, expiry)
            .await
            .map_err(|e| SkipReason::ChainUnavailable(e.to_string()))?;

        let contract = select_contract(&chain, direction, price).ok_or_else(|| {
            SkipReason::ChainUnavailable(format!("no {direction} contracts at {expiry}"))
        })?;

        Ok(Some(Alert::new(
            symbol,
            direction,
            contract.strike,
            expiry,
            contract.last_price,
            price,
        )))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PriceBar;
    use crate::runtime_config::RuntimeConfig;
    use crate::types::{Direction, OptionChain, OptionQuote};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    // ---- scripted providers ----------------------------------------------

    #[derive(Default)]
    struct ScriptedMarket {
        history: HashMap<String, Vec<PriceBar>>,
        prices: HashMap<String, f64>,
        expiries: HashMap<String, Vec<NaiveDate>>,
        chains: HashMap<(String, NaiveDate), OptionChain>,
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedMarket {
        async fn fetch_history(
            &self,
            symbol: &str,
            _range: &str,
            _interval: &str,
        ) -> Result<Vec<PriceBar>> {
            self.history
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow!("no history scripted for {symbol}"))
        }

        async fn fetch_last_price(&self, symbol: &str) -> Result<f64> {
            self.prices
                .get(symbol)
                .copied()
                .ok_or_else(|| anyhow!("no price scripted for {symbol}"))
        }

        async fn fetch_expiries(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
            self.expiries
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow!("no expiries scripted for {symbol}"))
        }

        async fn fetch_option_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<OptionChain> {
            self.chains
                .get(&(symbol.to_string(), expiry))
                .cloned()
                .ok_or_else(|| anyhow!("no chain scripted for {symbol} @ {expiry}"))
        }
    }

    struct FixedUniverse(Vec<String>);

    #[async_trait]
    impl UniverseProvider for FixedUniverse {
        async fn fetch_universe(&self, _threshold: f64) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingUniverse;

    #[async_trait]
    impl UniverseProvider for FailingUniverse {
        async fn fetch_universe(&self, _threshold: f64) -> Result<Vec<String>> {
            Err(anyhow!("index service down"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, message: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("webhook returned 500"));
            }
            self.messages.lock().push(message.to_string());
            Ok(())
        }
    }

    // ---- fixtures ---------------------------------------------------------

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

    /// 40-bar daily series engineered so MACD crosses above its signal line
    /// on the final bar while RSI sits deep in oversold territory: a steady
    /// run-up, a decelerating sell-off, then one small up-tick.
    fn bullish_crossover_closes() -> Vec<f64> {
        let mut closes = vec![100.0_f64];
        for _ in 0..12 {
            closes.push(closes.last().unwrap() + 2.0);
        }
        let mut drop = 4.0;
        for _ in 0..26 {
            closes.push(closes.last().unwrap() - drop);
            drop *= 0.85;
        }
        closes.push(closes.last().unwrap() + 0.3);
        assert_eq!(closes.len(), 40);
        closes
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quote(strike: f64, last_price: f64) -> OptionQuote {
        OptionQuote {
            contract_symbol: format!("TEST-C-{strike}"),
            strike,
            last_price,
            bid: last_price - 0.05,
            ask: last_price + 0.05,
            volume: 50.0,
            open_interest: 500.0,
        }
    }

    fn engine(
        market: ScriptedMarket,
        universe: Vec<String>,
        sink: Arc<RecordingSink>,
    ) -> (ScanEngine, Arc<AppState>) {
        let (tx, _rx) = mpsc::channel(1);
        let state = Arc::new(AppState::new(RuntimeConfig::default(), tx));
        let engine = ScanEngine::new(
            state.clone(),
            Arc::new(market),
            Arc::new(FixedUniverse(universe)),
            sink,
        );
        (engine, state)
    }

    // ---- end-to-end -------------------------------------------------------

    #[tokio::test]
    async fn bullish_crossover_produces_one_call_alert() {
        let expiries = vec![date(2026, 8, 14), date(2026, 8, 21), date(2026, 8, 28)];
        let target = date(2026, 8, 21); // second-soonest

        let mut market = ScriptedMarket::default();
        market
            .history
            .insert("AAPL".into(), bars_from_closes(&bullish_crossover_closes()));
        market.prices.insert("AAPL".into(), 101.0);
        market.expiries.insert("AAPL".into(), expiries);
        market.chains.insert(
            ("AAPL".into(), target),
            OptionChain {
                calls: vec![quote(95.0, 6.1), quote(100.0, 2.4), quote(105.0, 0.8)],
                puts: vec![quote(95.0, 0.5)],
            },
        );

        let sink = Arc::new(RecordingSink::default());
        let (engine, state) = engine(market, vec!["AAPL".into()], sink.clone());

        let report = engine.run_scan().await;

        assert_eq!(report.alerts.len(), 1);
        let alert = &report.alerts[0];
        assert_eq!(alert.symbol, "AAPL");
        assert_eq!(alert.direction, Direction::Call);
        assert!((alert.strike - 100.0).abs() < f64::EPSILON);
        assert_eq!(alert.expiry, target);
        assert!((alert.last_price - 2.4).abs() < f64::EPSILON);
        assert!((alert.underlying_price - 101.0).abs() < f64::EPSILON);

        assert_eq!(report.notified, 1);
        assert_eq!(report.notify_failures, 0);
        assert!(report.skipped.is_empty());

        let messages = sink.messages.lock();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("**CALL ALERT**"));
        assert!(messages[0].contains("Ticker: AAPL"));

        // Report and alert ring land in shared state for the dashboard.
        assert!(state.last_report.read().is_some());
        assert_eq!(state.recent_alerts.read().len(), 1);
    }

    #[tokio::test]
    async fn twenty_nine_bars_skips_thirty_proceeds() {
        // A flat series computes cleanly but can never signal, which is
        // exactly what the 30-bar boundary case needs.
        let mut market = ScriptedMarket::default();
        market
            .history
            .insert("SHORT".into(), bars_from_closes(&vec![50.0; 29]));
        market
            .history
            .insert("EXACT".into(), bars_from_closes(&vec![50.0; 30]));

        let sink = Arc::new(RecordingSink::default());
        let (engine, _state) = engine(market, vec!["SHORT".into(), "EXACT".into()], sink);

        let report = engine.run_scan().await;

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].symbol, "SHORT");
        assert!(report.skipped[0].reason.contains("29 < 30"));
        assert_eq!(report.no_signal, 1);
        assert!(report.alerts.is_empty());
    }

    #[tokio::test]
    async fn chain_unavailable_skips_without_aborting_scan() {
        // Signal fires but the symbol lists no expirations.
        let mut market = ScriptedMarket::default();
        market
            .history
            .insert("NOEXP".into(), bars_from_closes(&bullish_crossover_closes()));
        market.prices.insert("NOEXP".into(), 101.0);
        market.expiries.insert("NOEXP".into(), Vec::new());
        // A second, boring ticker still completes the cycle.
        market
            .history
            .insert("FLAT".into(), bars_from_closes(&vec![50.0; 40]));

        let sink = Arc::new(RecordingSink::default());
        let (engine, _state) = engine(market, vec!["NOEXP".into(), "FLAT".into()], sink);

        let report = engine.run_scan().await;

        assert!(report.alerts.is_empty());
        assert_eq!(report.no_signal, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("no expirations"));
    }

    #[tokio::test]
    async fn single_expiry_falls_back_without_panicking() {
        let only = date(2026, 8, 14);

        let mut market = ScriptedMarket::default();
        market
            .history
            .insert("ONE".into(), bars_from_closes(&bullish_crossover_closes()));
        market.prices.insert("ONE".into(), 101.0);
        market.expiries.insert("ONE".into(), vec![only]);
        market.chains.insert(
            ("ONE".into(), only),
            OptionChain {
                calls: vec![quote(100.0, 1.9)],
                puts: Vec::new(),
            },
        );

        let sink = Arc::new(RecordingSink::default());
        let (engine, _state) = engine(market, vec!["ONE".into()], sink);

        let report = engine.run_scan().await;
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].expiry, only);
    }

    #[tokio::test]
    async fn notification_failure_is_counted_not_fatal() {
        let target = date(2026, 8, 21);

        let mut market = ScriptedMarket::default();
        market
            .history
            .insert("AAPL".into(), bars_from_closes(&bullish_crossover_closes()));
        market.prices.insert("AAPL".into(), 101.0);
        market
            .expiries
            .insert("AAPL".into(), vec![date(2026, 8, 14), target]);
        market.chains.insert(
            ("AAPL".into(), target),
            OptionChain {
                calls: vec![quote(100.0, 2.4)],
                puts: Vec::new(),
            },
        );

        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let (engine, state) = engine(market, vec!["AAPL".into()], sink);

        let report = engine.run_scan().await;

        // The alert still exists and the cycle still completes.
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.notified, 0);
        assert_eq!(report.notify_failures, 1);
        assert_eq!(state.recent_errors.read().len(), 1);
    }

    #[tokio::test]
    async fn universe_failure_yields_empty_report() {
        let (tx, _rx) = mpsc::channel(1);
        let state = Arc::new(AppState::new(RuntimeConfig::default(), tx));
        let engine = ScanEngine::new(
            state.clone(),
            Arc::new(ScriptedMarket::default()),
            Arc::new(FailingUniverse),
            Arc::new(RecordingSink::default()),
        );

        let report = engine.run_scan().await;

        assert_eq!(report.universe_size, 0);
        assert!(report.alerts.is_empty());
        assert_eq!(state.recent_errors.read().len(), 1);
    }

    #[tokio::test]
    async fn history_fetch_failure_is_a_skip() {
        // Universe lists a symbol the market provider has never heard of.
        let sink = Arc::new(RecordingSink::default());
        let (engine, _state) = engine(ScriptedMarket::default(), vec!["GHOST".into()], sink);

        let report = engine.run_scan().await;

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.contains("history unavailable"));
    }
}
