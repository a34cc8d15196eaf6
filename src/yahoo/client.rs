// =============================================================================
// Yahoo Finance REST API Client — public quote/chart/options endpoints
// =============================================================================
//
// All endpoints used here are unauthenticated reads. Chart responses carry
// occasional null entries for halted sessions; those bars are skipped rather
// than failing the whole series. Every request shares a 10 s timeout.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use tracing::{debug, instrument, warn};

use crate::market_data::{MarketDataProvider, PriceBar};
use crate::types::OptionChain;

/// Yahoo Finance client for daily bars, spot prices, option chains and
/// market capitalization lookups.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new() -> Self {
        // Yahoo rejects requests without a browser-ish user agent.
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; argus-bot/1.0)")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!("YahooClient initialised (base_url=https://query1.finance.yahoo.com)");

        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Raw endpoint helpers
    // -------------------------------------------------------------------------

    /// GET a Yahoo endpoint and return the parsed JSON body, failing on any
    /// non-2xx status.
    async fn get_json(&self, url: &str, what: &str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {what} request failed"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {what} response"))?;

        if !status.is_success() {
            anyhow::bail!("Yahoo GET {what} returned {status}: {body}");
        }

        Ok(body)
    }

    /// GET /v8/finance/chart/{symbol} and return the first result object.
    async fn get_chart_result(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<serde_json::Value> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, range, interval
        );
        let body = self.get_json(&url, "/v8/finance/chart").await?;

        body["chart"]["result"]
            .as_array()
            .and_then(|arr| arr.first().cloned())
            .with_context(|| format!("chart response for {symbol} has no result"))
    }

    /// GET /v7/finance/options/{symbol}, optionally scoped to one expiration
    /// epoch, and return the first result object.
    async fn get_options_result(
        &self,
        symbol: &str,
        expiry_epoch: Option<i64>,
    ) -> Result<serde_json::Value> {
        let url = match expiry_epoch {
            Some(epoch) => format!(
                "{}/v7/finance/options/{}?date={}",
                self.base_url, symbol, epoch
            ),
            None => format!("{}/v7/finance/options/{}", self.base_url, symbol),
        };
        let body = self.get_json(&url, "/v7/finance/options").await?;

        body["optionChain"]["result"]
            .as_array()
            .and_then(|arr| arr.first().cloned())
            .with_context(|| format!("options response for {symbol} has no result"))
    }

    /// GET /v10/finance/quoteSummary/{symbol}?modules=price and extract the
    /// market capitalization in USD.
    #[instrument(skip(self), name = "yahoo::get_market_cap")]
    pub async fn get_market_cap(&self, symbol: &str) -> Result<f64> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=price",
            self.base_url, symbol
        );
        let body = self.get_json(&url, "/v10/finance/quoteSummary").await?;

        let cap = body["quoteSummary"]["result"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|r| r["price"]["marketCap"]["raw"].as_f64())
            .with_context(|| format!("quoteSummary for {symbol} has no marketCap"))?;

        debug!(symbol, market_cap = cap, "market cap retrieved");
        Ok(cap)
    }

    // -------------------------------------------------------------------------
    // Internal parse helpers
    // -------------------------------------------------------------------------

    /// Zip chart timestamps with the OHLCV arrays, skipping bars where any
    /// component is null (Yahoo emits those for halted or partial sessions).
    fn parse_bars(result: &serde_json::Value, symbol: &str) -> Result<Vec<PriceBar>> {
        let timestamps = result["timestamp"]
            .as_array()
            .map(|a| a.as_slice())
            .unwrap_or(&[]);

        let quote = result["indicators"]["quote"]
            .as_array()
            .and_then(|arr| arr.first().cloned())
            .with_context(|| format!("chart for {symbol} has no quote block"))?;

        let field = |name: &str, i: usize| quote[name].as_array().and_then(|a| a.get(i)?.as_f64());

        let mut bars = Vec::with_capacity(timestamps.len());
        let mut skipped = 0usize;

        for (i, ts) in timestamps.iter().enumerate() {
            let timestamp = match ts.as_i64() {
                Some(t) => t,
                None => {
                    skipped += 1;
                    continue;
                }
            };

            match (
                field("open", i),
                field("high", i),
                field("low", i),
                field("close", i),
                field("volume", i),
            ) {
                (Some(open), Some(high), Some(low), Some(close), Some(volume)) => {
                    bars.push(PriceBar {
                        timestamp,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    });
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(symbol, skipped, "skipped chart bars with null components");
        }

        Ok(bars)
    }

    /// Yahoo expiration epochs are midnight UTC of the expiry date.
    fn expiry_to_epoch(expiry: NaiveDate) -> i64 {
        expiry.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    fn epoch_to_expiry(epoch: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(epoch, 0).map(|dt| dt.date_naive())
    }
}

// =============================================================================
// MarketDataProvider implementation
// =============================================================================

#[async_trait]
impl MarketDataProvider for YahooClient {
    #[instrument(skip(self), name = "yahoo::fetch_history")]
    async fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>> {
        let result = self.get_chart_result(symbol, range, interval).await?;
        let bars = Self::parse_bars(&result, symbol)?;
        debug!(symbol, range, interval, count = bars.len(), "history fetched");
        Ok(bars)
    }

    #[instrument(skip(self), name = "yahoo::fetch_last_price")]
    async fn fetch_last_price(&self, symbol: &str) -> Result<f64> {
        let result = self.get_chart_result(symbol, "1d", "1d").await?;

        // Prefer the meta quote; fall back to the last close of the day.
        if let Some(price) = result["meta"]["regularMarketPrice"].as_f64() {
            return Ok(price);
        }

        let bars = Self::parse_bars(&result, symbol)?;
        bars.last()
            .map(|b| b.close)
            .with_context(|| format!("no price data for {symbol}"))
    }

    #[instrument(skip(self), name = "yahoo::fetch_expiries")]
    async fn fetch_expiries(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let result = self.get_options_result(symbol, None).await?;

        let epochs = result["expirationDates"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let expiries: Vec<NaiveDate> = epochs
            .iter()
            .filter_map(|e| e.as_i64())
            .filter_map(Self::epoch_to_expiry)
            .collect();

        debug!(symbol, count = expiries.len(), "expiries fetched");
        Ok(expiries)
    }

    #[instrument(skip(self), name = "yahoo::fetch_option_chain")]
    async fn fetch_option_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<OptionChain> {
        let epoch = Self::expiry_to_epoch(expiry);
        let result = self.get_options_result(symbol, Some(epoch)).await?;

        let options = result["options"]
            .as_array()
            .and_then(|arr| arr.first().cloned())
            .with_context(|| format!("option chain for {symbol} @ {expiry} is empty"))?;

        let chain: OptionChain = serde_json::from_value(options)
            .with_context(|| format!("failed to parse option chain for {symbol} @ {expiry}"))?;

        debug!(
            symbol,
            %expiry,
            calls = chain.calls.len(),
            puts = chain.puts.len(),
            "option chain fetched"
        );
        Ok(chain)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bars_skips_null_entries() {
        let result = serde_json::json!({
            "timestamp": [1000, 2000, 3000],
            "indicators": { "quote": [{
                "open":   [1.0, null, 3.0],
                "high":   [1.5, 2.5, 3.5],
                "low":    [0.5, 1.5, 2.5],
                "close":  [1.2, 2.2, 3.2],
                "volume": [100.0, 200.0, 300.0]
            }]}
        });
        let bars = YahooClient::parse_bars(&result, "TEST").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1000);
        assert_eq!(bars[1].timestamp, 3000);
        assert!((bars[1].close - 3.2).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_bars_missing_quote_block_errors() {
        let result = serde_json::json!({ "timestamp": [1000] });
        assert!(YahooClient::parse_bars(&result, "TEST").is_err());
    }

    #[test]
    fn expiry_epoch_roundtrip() {
        let expiry = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
        let epoch = YahooClient::expiry_to_epoch(expiry);
        assert_eq!(YahooClient::epoch_to_expiry(epoch), Some(expiry));
    }
}
