//! Query facades over the ledger database
//!
//! Each service answers one family of read requests. Every answer goes through
//! the cache-aside accessor; a miss runs the SQL, decodes, and caches the result.

use chrono::Utc;
use sqlx::PgPool;

use crate::cache::Cache;
use crate::db;
use crate::rewards::{today_utc_midnight, RewardSample, RewardSeries, SECONDS_PER_DAY};

mod chain_service;
mod hotspot_service;
mod price_feed;
mod search_service;
mod stats_service;
mod validator_service;
mod wallet_service;

pub use chain_service::ChainService;
pub use hotspot_service::HotspotService;
pub use price_feed::PriceFeed;
pub use search_service::{SearchResult, SearchService};
pub use stats_service::StatsService;
pub use validator_service::ValidatorService;
pub use wallet_service::WalletService;

/// Database and cache handles injected into every service
#[derive(Clone)]
pub struct LedgerContext {
    pub pool: PgPool,
    pub cache: Cache,
}

impl LedgerContext {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }
}

/// Which side of a reward the samples are selected by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RewardOwner {
    Gateway,
    Account,
}

impl RewardOwner {
    fn samples_sql(self) -> &'static str {
        match self {
            Self::Gateway => {
                "SELECT time::BIGINT AS time, amount::BIGINT AS amount FROM rewards WHERE gateway = $1 AND time >= $2"
            }
            Self::Account => {
                "SELECT time::BIGINT AS time, amount::BIGINT AS amount FROM rewards WHERE account = $1 AND time >= $2"
            }
        }
    }
}

pub(crate) async fn reward_samples(
    pool: &PgPool,
    owner: RewardOwner,
    subject: &str,
    since: i64,
) -> Vec<RewardSample> {
    db::fetch_lenient(
        pool,
        sqlx::query(owner.samples_sql()).bind(subject).bind(since),
        "reward_samples",
    )
    .await
}

/// Dense daily series over the last `days` days.
pub(crate) async fn reward_series(
    pool: &PgPool,
    owner: RewardOwner,
    subject: &str,
    days: i64,
) -> RewardSeries {
    let since = Utc::now().timestamp() - days * SECONDS_PER_DAY;
    let samples = reward_samples(pool, owner, subject, since).await;

    crate::rewards::bucket_by_day(samples.into_iter().map(|s| (s.time, s.amount)))
}

/// Raw samples since yesterday's UTC midnight, keyed by their own timestamp.
pub(crate) async fn rewards_since_yesterday(
    pool: &PgPool,
    owner: RewardOwner,
    subject: &str,
) -> RewardSeries {
    let since = today_utc_midnight() - SECONDS_PER_DAY + 1;
    let samples = reward_samples(pool, owner, subject, since).await;

    let mut series = RewardSeries::new();
    for sample in samples {
        *series.entry(sample.time).or_insert(0) += sample.amount;
    }
    series
}

/// `LIKE` patterns for a free-text name query.
///
/// Hotspot and validator names are lowercase words joined by dashes, so the
/// query is split on spaces, dashes and underscores and every word must match.
pub(crate) fn name_patterns(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split([' ', '-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| format!("%{word}%"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_patterns_split_on_separators() {
        assert_eq!(
            name_patterns("Angry-Purple tiger_"),
            vec!["%angry%", "%purple%", "%tiger%"]
        );
        assert!(name_patterns(" - _ ").is_empty());
    }
}
