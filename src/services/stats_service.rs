use std::collections::BTreeMap;

use chrono::{Duration as ChronoDuration, Utc};

use super::{LedgerContext, PriceFeed, ValidatorService};
use crate::cache::{keys, TTL_HOUR, TTL_TEN_MINUTES, TTL_VOLATILE};
use crate::db::{
    self,
    rows::{DailyCountRow, LastHotspotRow, NamedCountRow, NamedValueRow, OraclePriceRow},
};
use crate::models::{
    BlockHeight, HntPrice, HotspotTotals, HotspotTrend, LastHotspot, LastMaker, OraclePrices,
    Stats, StatsInventory, Validator, ValidatorStats, VarsInventory,
};
use crate::rewards::SECONDS_PER_DAY;

const TREND_DAYS: i64 = 30;
const DC_SPENT_DAYS: i64 = 30;
const ORACLE_PRICE_DAYS: i64 = 30;

/// Oracle prices are stored in 1e-8 units; this many units make a cent.
const ORACLE_UNITS_PER_CENT: i64 = 1_000_000;

/// Cumulative hotspot count per day, ending at `total`.
///
/// `daily` holds the hotspots added per `YYYY-MM-DD` day inside the window; the
/// series starts from the count that existed before the window.
pub fn cumulative_trend(daily: Vec<DailyCountRow>, total: i64) -> HotspotTrend {
    let daily: BTreeMap<String, i64> = daily.into_iter().fold(BTreeMap::new(), |mut acc, row| {
        *acc.entry(row.day).or_insert(0) += row.count;
        acc
    });

    let added: i64 = daily.values().sum();
    let start = total - added;

    let mut running = start;
    let last_days = daily
        .into_iter()
        .map(|(day, count)| {
            running += count;
            (day, running)
        })
        .collect();

    HotspotTrend {
        last_days,
        start,
        end: total,
    }
}

/// Oracle prices floored to cents, in time order, with consecutive repeats dropped.
pub fn summarize_oracle_prices(mut rows: Vec<OraclePriceRow>) -> OraclePrices {
    rows.sort_by_key(|row| row.time);

    let mut prices = BTreeMap::new();
    let mut previous: Option<f64> = None;
    let (mut min, mut max) = (f64::MAX, f64::MIN);

    for row in rows {
        let price = row.price.div_euclid(ORACLE_UNITS_PER_CENT) as f64 / 100.0;
        if previous == Some(price) {
            continue;
        }
        previous = Some(price);

        min = min.min(price);
        max = max.max(price);
        prices.insert(row.time, price);
    }

    if prices.is_empty() {
        return OraclePrices::default();
    }

    OraclePrices { min, max, prices }
}

/// Staked and online counts plus a histogram of heartbeat versions.
pub fn tally_validators(validators: &[Validator]) -> (i64, i64, BTreeMap<i64, i64>) {
    let mut staked = 0;
    let mut online = 0;
    let mut versions = BTreeMap::new();

    for validator in validators {
        if validator.is_staked() {
            staked += 1;
            if validator.is_online() {
                online += 1;
            }
        }
        *versions.entry(validator.version_heartbeat).or_insert(0) += 1;
    }

    (staked, online, versions)
}

/// Network-wide figures for the overview page
#[derive(Clone)]
pub struct StatsService {
    ctx: LedgerContext,
    validators: ValidatorService,
    price_feed: PriceFeed,
}

impl StatsService {
    pub fn new(ctx: LedgerContext, validators: ValidatorService, price_feed: PriceFeed) -> Self {
        Self {
            ctx,
            validators,
            price_feed,
        }
    }

    pub async fn overview(&self) -> Stats {
        self.ctx
            .cache
            .get_or_compute(keys::HOMEPAGE_STATS, TTL_VOLATILE, move || async move {
                let inventory = self.inventory().await;
                let vars = self.vars().await;
                let trend = self.trend(inventory.hotspots).await;
                let market = self.price_feed.snapshot().await;
                let dc_spent = self.dc_spent().await;
                let last_hotspot = self.last_hotspot().await;
                let last_maker = self.makers_data().await;
                let oracle = self.oracle_price().await;

                let validators = self.validators.all().await;
                let (staked, online, versions) = tally_validators(&validators);

                Stats {
                    hotspots: HotspotTotals {
                        total: inventory.hotspots,
                        online: inventory.hotspots_online,
                        trend,
                    },
                    hnt_price: HntPrice {
                        price: market.market_data.current_price.usd,
                        percentage: market.market_data.price_change_percentage_24h,
                        oracle,
                    },
                    block: BlockHeight {
                        height: inventory.blocks,
                        change: 0,
                    },
                    dc_spent,
                    validator: ValidatorStats {
                        count: staked,
                        consensus_number: vars.consensus_number,
                        stake_withdraw_cooldown: vars.stake_withdraw_cooldown,
                        validator_minimum_stake: vars.validator_minimum_stake,
                        online,
                        versions,
                        apr: self.validators.apr(online),
                    },
                    challenges: inventory.challenges,
                    oui_count: inventory.ouis,
                    countries: inventory.countries,
                    cities: inventory.cities,
                    circulating_supply: market.market_data.circulating_supply,
                    market_cap: market.market_data.market_cap.usd,
                    market_cap_rank: market.market_cap_rank,
                    last_hotspot,
                    last_maker,
                }
            })
            .await
    }

    pub async fn inventory(&self) -> StatsInventory {
        self.ctx
            .cache
            .get_or_compute(keys::STATS_INVENTORY, TTL_VOLATILE, move || async move {
                let rows: Vec<NamedCountRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(
                        "SELECT name::TEXT AS name, COALESCE(value, 0)::BIGINT AS value FROM stats_inventory",
                    ),
                    "stats_inventory",
                )
                .await;

                let mut inventory = StatsInventory::default();
                for row in rows {
                    inventory.apply(&row.name, row.value);
                }
                inventory
            })
            .await
    }

    pub async fn vars(&self) -> VarsInventory {
        self.ctx
            .cache
            .get_or_compute(keys::VARS_INVENTORY, TTL_VOLATILE, move || async move {
                let rows: Vec<NamedValueRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(
                        "SELECT name::TEXT AS name, COALESCE(value::TEXT, '') AS value FROM vars_inventory",
                    ),
                    "vars_inventory",
                )
                .await;

                let mut vars = VarsInventory::default();
                for row in rows {
                    vars.apply(&row.name, &row.value);
                }
                vars
            })
            .await
    }

    pub async fn trend(&self, total_hotspots: i64) -> HotspotTrend {
        self.ctx
            .cache
            .get_or_compute(keys::HOTSPOT_TREND, TTL_HOUR, move || async move {
                let since = Utc::now() - ChronoDuration::days(TREND_DAYS);
                let rows: Vec<DailyCountRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT TO_CHAR(first_timestamp AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day,
                               COUNT(*)::BIGINT AS count
                        FROM gateway_inventory
                        WHERE first_timestamp >= $1
                        GROUP BY day
                        "#,
                    )
                    .bind(since),
                    "hotspot_trend",
                )
                .await;

                cumulative_trend(rows, total_hotspots)
            })
            .await
    }

    /// Data credits burned over the last 30 days.
    pub async fn dc_spent(&self) -> i64 {
        self.ctx
            .cache
            .get_or_compute(keys::DC_SPENT, TTL_HOUR, move || async move {
                let since = Utc::now().timestamp() - DC_SPENT_DAYS * SECONDS_PER_DAY;
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM dc_burns WHERE time >= $1",
                    )
                    .bind(since),
                    "dc_spent",
                )
                .await
            })
            .await
    }

    /// Number of makers and the most recently registered one.
    pub async fn makers_data(&self) -> LastMaker {
        self.ctx
            .cache
            .get_or_compute(keys::MAKERS_DATA, TTL_HOUR, move || async move {
                db::fetch_optional::<LastMaker>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT (SELECT COUNT(*) FROM makers)::BIGINT AS count,
                               COALESCE(name, '')::TEXT AS name,
                               COALESCE(address, '')::TEXT AS address
                        FROM makers
                        ORDER BY id DESC
                        LIMIT 1
                        "#,
                    ),
                    "makers_data",
                )
                .await
                .unwrap_or_default()
            })
            .await
    }

    /// Raw price of the latest oracle report.
    pub async fn oracle_price(&self) -> i64 {
        self.ctx
            .cache
            .get_or_compute(keys::ORACLE_PRICE, TTL_TEN_MINUTES, move || async move {
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COALESCE(price, 0)::BIGINT FROM oracle_prices ORDER BY block DESC LIMIT 1",
                    ),
                    "oracle_price",
                )
                .await
            })
            .await
    }

    pub async fn oracle_prices(&self) -> OraclePrices {
        self.ctx
            .cache
            .get_or_compute(keys::ORACLE_PRICES, TTL_TEN_MINUTES, move || async move {
                let since = Utc::now().timestamp() - ORACLE_PRICE_DAYS * SECONDS_PER_DAY;
                let rows: Vec<OraclePriceRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT COALESCE(o.price, 0)::BIGINT AS price,
                               b.time::BIGINT AS time
                        FROM oracle_prices o
                        INNER JOIN blocks b ON b.height = o.block
                        WHERE b.time > $1
                        "#,
                    )
                    .bind(since),
                    "oracle_prices",
                )
                .await;

                summarize_oracle_prices(rows)
            })
            .await
    }

    /// Most recently added hotspot that has asserted a location.
    pub async fn last_hotspot(&self) -> LastHotspot {
        self.ctx
            .cache
            .get_or_compute(keys::LAST_HOTSPOT, TTL_HOUR, move || async move {
                db::fetch_optional::<LastHotspotRow>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT h.address::TEXT AS address,
                               COALESCE(h.name, '')::TEXT AS name,
                               COALESCE(h.location, '')::TEXT AS location,
                               COALESCE(l.long_country, '')::TEXT AS long_country,
                               COALESCE(l.short_country, '')::TEXT AS short_country
                        FROM gateway_inventory h
                        INNER JOIN locations l ON l.location = h.location
                        WHERE h.nonce > 0
                        ORDER BY h.first_block DESC
                        LIMIT 1
                        "#,
                    ),
                    "last_hotspot",
                )
                .await
                .map(LastHotspot::from)
                .unwrap_or_default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: &str, count: i64) -> DailyCountRow {
        DailyCountRow {
            day: day.into(),
            count,
        }
    }

    #[test]
    fn trend_accumulates_from_pre_window_total() {
        let trend = cumulative_trend(
            vec![day("2024-03-02", 5), day("2024-03-01", 10), day("2024-03-04", 1)],
            1_000,
        );

        assert_eq!(trend.start, 984);
        assert_eq!(trend.end, 1_000);
        assert_eq!(
            trend.last_days.into_iter().collect::<Vec<_>>(),
            vec![
                ("2024-03-01".to_string(), 994),
                ("2024-03-02".to_string(), 999),
                ("2024-03-04".to_string(), 1_000),
            ]
        );
    }

    #[test]
    fn oracle_prices_drop_consecutive_repeats() {
        let rows = vec![
            OraclePriceRow { price: 1_234_567_890, time: 30 },
            OraclePriceRow { price: 1_234_000_000, time: 10 },
            OraclePriceRow { price: 1_234_999_999, time: 20 },
            OraclePriceRow { price: 1_100_000_000, time: 40 },
        ];

        let summary = summarize_oracle_prices(rows);

        // 12.34 at t=10 repeats at t=20 and t=30
        assert_eq!(
            summary.prices.into_iter().collect::<Vec<_>>(),
            vec![(10, 12.34), (40, 11.0)]
        );
        assert_eq!(summary.min, 11.0);
        assert_eq!(summary.max, 12.34);
    }

    #[test]
    fn no_oracle_prices_means_zero_bounds() {
        let summary = summarize_oracle_prices(Vec::new());
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 0.0);
        assert!(summary.prices.is_empty());
    }

    #[test]
    fn only_staked_validators_count_as_online() {
        let validator = |online: &str, staked: &str, version: i64| Validator {
            online: online.into(),
            staked: staked.into(),
            version_heartbeat: version,
            ..Default::default()
        };
        let validators = vec![
            validator("online", "staked", 10),
            validator("online", "unstaked", 10),
            validator("offline", "staked", 9),
        ];

        let (staked, online, versions) = tally_validators(&validators);

        assert_eq!(staked, 2);
        assert_eq!(online, 1);
        assert_eq!(versions, BTreeMap::from([(9, 1), (10, 2)]));
    }
}
