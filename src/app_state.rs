// =============================================================================
// Central Application State — Argus Option Scanner
// =============================================================================
//
// The single source of truth shared between the scan loop and the dashboard
// API. All ticker evaluation is stateless per cycle; what lives here is the
// configuration, the latest cycle report, and a bounded ring of recent
// alerts for the dashboard.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
// =============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::runtime_config::RuntimeConfig;
use crate::scanner::ScanReport;
use crate::types::Alert;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Maximum number of recent alerts to retain.
const MAX_RECENT_ALERTS: usize = 100;
/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Most recent alerts, newest first.
    pub recent_alerts: RwLock<VecDeque<Alert>>,

    /// Report of the most recently completed scan cycle.
    pub last_report: RwLock<Option<ScanReport>>,

    /// Recent error log for the dashboard.
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Channel used by the dashboard API to request an immediate scan.
    pub scan_trigger: mpsc::Sender<()>,

    /// Instant when the engine was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, scan_trigger: mpsc::Sender<()>) -> Self {
        Self {
            state_version: AtomicU64::new(0),
            runtime_config: Arc::new(RwLock::new(config)),
            recent_alerts: RwLock::new(VecDeque::with_capacity(MAX_RECENT_ALERTS)),
            last_report: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            scan_trigger,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn increment_version(&self) {
        self.state_version.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Append an alert to the ring, newest first, trimming the tail.
    pub fn push_alert(&self, alert: Alert) {
        let mut ring = self.recent_alerts.write();
        ring.push_front(alert);
        while ring.len() > MAX_RECENT_ALERTS {
            ring.pop_back();
        }
    }

    /// Record an error for the dashboard log, trimming the oldest entries.
    pub fn record_error(&self, message: impl Into<String>) {
        let mut errors = self.recent_errors.write();
        errors.push(ErrorRecord {
            message: message.into(),
            at: chrono::Utc::now().to_rfc3339(),
        });
        if errors.len() > MAX_RECENT_ERRORS {
            let excess = errors.len() - MAX_RECENT_ERRORS;
            errors.drain(..excess);
        }
    }

    /// Snapshot for the dashboard `state` endpoint.
    pub fn build_snapshot(&self) -> serde_json::Value {
        let config = self.runtime_config.read();
        serde_json::json!({
            "state_version": self.current_state_version(),
            "scan_mode": config.scan_mode.to_string(),
            "candidates": config.candidate_symbols.len(),
            "scan_interval_hours": config.scan_interval_hours,
            "uptime_seconds": self.start_time.elapsed().as_secs(),
            "recent_alerts": self.recent_alerts.read().len(),
            "last_report": self.last_report.read().clone(),
            "recent_errors": self.recent_errors.read().clone(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use chrono::NaiveDate;

    fn state() -> AppState {
        let (tx, _rx) = mpsc::channel(1);
        AppState::new(RuntimeConfig::default(), tx)
    }

    fn alert(symbol: &str) -> Alert {
        Alert::new(
            symbol,
            Direction::Call,
            100.0,
            NaiveDate::from_ymd_opt(2026, 8, 21).unwrap(),
            2.5,
            99.0,
        )
    }

    #[test]
    fn alert_ring_is_bounded_and_newest_first() {
        let state = state();
        for i in 0..(MAX_RECENT_ALERTS + 10) {
            state.push_alert(alert(&format!("SYM{i}")));
        }
        let ring = state.recent_alerts.read();
        assert_eq!(ring.len(), MAX_RECENT_ALERTS);
        assert_eq!(ring.front().unwrap().symbol, format!("SYM{}", MAX_RECENT_ALERTS + 9));
    }

    #[test]
    fn error_log_is_bounded() {
        let state = state();
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            state.record_error(format!("error {i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors.last().unwrap().message, format!("error {}", MAX_RECENT_ERRORS + 4));
    }

    #[test]
    fn version_counter_increments() {
        let state = state();
        let before = state.current_state_version();
        state.increment_version();
        assert_eq!(state.current_state_version(), before + 1);
    }
}
