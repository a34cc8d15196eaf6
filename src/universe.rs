// =============================================================================
// Universe resolution — market-cap filtered candidate list
// =============================================================================
//
// Candidates come from configuration; each one's market capitalization is
// looked up fresh per cycle and compared against the threshold. A failed
// lookup excludes that ticker with a warning — it never fails the fetch.
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::market_data::UniverseProvider;
use crate::yahoo::YahooClient;

/// Filters a fixed candidate list down to large caps via live lookups.
pub struct MarketCapUniverse {
    client: Arc<YahooClient>,
    candidates: Vec<String>,
}

impl MarketCapUniverse {
    pub fn new(client: Arc<YahooClient>, candidates: Vec<String>) -> Self {
        Self { client, candidates }
    }
}

#[async_trait]
impl UniverseProvider for MarketCapUniverse {
    async fn fetch_universe(&self, threshold: f64) -> Result<Vec<String>> {
        let mut universe = Vec::with_capacity(self.candidates.len());

        for symbol in &self.candidates {
            match self.client.get_market_cap(symbol).await {
                Ok(cap) if cap >= threshold => universe.push(symbol.clone()),
                Ok(cap) => {
                    debug!(symbol = %symbol, market_cap = cap, threshold, "below threshold, excluded");
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "market cap lookup failed, excluded");
                }
            }
        }

        info!(
            candidates = self.candidates.len(),
            selected = universe.len(),
            "universe resolved"
        );
        Ok(universe)
    }
}
