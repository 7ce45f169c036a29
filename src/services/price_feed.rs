use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cache::{keys, Cache, TTL_HOUR};
use crate::models::MarketSnapshot;

const PRICE_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Market data from the external price API, cached for an hour.
#[derive(Clone)]
pub struct PriceFeed {
    http_client: reqwest::Client,
    url: String,
    cache: Cache,
}

impl PriceFeed {
    pub fn new(url: String, cache: Cache) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(PRICE_FEED_TIMEOUT)
            .build()
            .context("failed to build price feed HTTP client")?;

        Ok(Self {
            http_client,
            url,
            cache,
        })
    }

    /// Latest snapshot; zero values when the feed cannot be reached.
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.cache
            .get_or_try_compute(keys::PRICE_FEED, TTL_HOUR, move || self.fetch())
            .await
    }

    async fn fetch(&self) -> Result<MarketSnapshot> {
        let response = self
            .http_client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("price feed unreachable")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("price feed returned {status}");
        }

        let snapshot: MarketSnapshot = response
            .json()
            .await
            .context("price feed returned an unexpected document")?;

        info!(
            price = snapshot.market_data.current_price.usd,
            rank = snapshot.market_cap_rank,
            "price feed refreshed"
        );
        Ok(snapshot)
    }
}
