// =============================================================================
// Argus Option Scanner — Main Entry Point
// =============================================================================
//
// Boots the dashboard API and the periodic scan loop. Scans run once at
// startup and then on a fixed interval (default every 4 hours); the
// dashboard can pause scheduled scans or trigger one immediately.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod market_data;
mod notify;
mod options;
mod runtime_config;
mod scanner;
mod signals;
mod types;
mod universe;
mod yahoo;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::notify::{DiscordWebhook, LogSink, NotificationSink};
use crate::runtime_config::RuntimeConfig;
use crate::scanner::ScanEngine;
use crate::types::ScanMode;
use crate::universe::MarketCapUniverse;
use crate::yahoo::YahooClient;

const CONFIG_PATH: &str = "scanner_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Argus Option Scanner — Starting Up               ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override candidate symbols from env if available.
    if let Ok(syms) = std::env::var("ARGUS_SYMBOLS") {
        config.candidate_symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if config.candidate_symbols.is_empty() {
        warn!("Candidate symbol list is empty — every scan will be a no-op");
    }

    info!(
        candidates = config.candidate_symbols.len(),
        market_cap_threshold = config.market_cap_threshold,
        scan_interval_hours = config.scan_interval_hours,
        scan_mode = %config.scan_mode,
        "Configured scanner"
    );

    let scan_interval_hours = config.scan_interval_hours.max(1);

    // ── 2. Build shared state ────────────────────────────────────────────
    let (scan_tx, mut scan_rx) = tokio::sync::mpsc::channel::<()>(1);
    let state = Arc::new(AppState::new(config, scan_tx));

    // ── 3. Build providers & sink ────────────────────────────────────────
    let yahoo = Arc::new(YahooClient::new());

    let candidates = state.runtime_config.read().candidate_symbols.clone();
    let universe = Arc::new(MarketCapUniverse::new(yahoo.clone(), candidates));

    let sink: Arc<dyn NotificationSink> = match std::env::var("DISCORD_WEBHOOK_URL") {
        Ok(url) if !url.is_empty() => Arc::new(DiscordWebhook::new(url)),
        _ => {
            warn!("DISCORD_WEBHOOK_URL is not set — alerts will only be logged");
            Arc::new(LogSink)
        }
    };

    let engine = Arc::new(ScanEngine::new(state.clone(), yahoo, universe, sink));

    // ── 4. Spawn the dashboard API ───────────────────────────────────────
    let api_addr = std::env::var("ARGUS_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8090".into());
    let router = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!(addr = %api_addr, "Dashboard API listening");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Dashboard API server exited");
        }
    });

    // ── 5. Scan loop ─────────────────────────────────────────────────────
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
        scan_interval_hours * 3600,
    ));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mode = state.runtime_config.read().scan_mode;
                if mode == ScanMode::Paused {
                    info!("Scheduled scan skipped (paused)");
                    continue;
                }
                engine.run_scan().await;
            }
            Some(()) = scan_rx.recv() => {
                // Manual triggers run even while paused.
                info!("Running manually triggered scan");
                engine.run_scan().await;
            }
        }
    }
}
