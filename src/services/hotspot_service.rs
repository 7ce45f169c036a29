use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{name_patterns, reward_series, rewards_since_yesterday, LedgerContext, RewardOwner};
use crate::activity::{
    decode_activity, ActivityPayload, ActorRole, HotspotDirectory, HotspotLocation,
    RawTransactionRecord,
};
use crate::cache::{
    keys, TTL_ACTIVITY, TTL_DAY, TTL_HOUR, TTL_SEARCH, TTL_TEN_MINUTES, TTL_VOLATILE,
};
use crate::db::{
    self,
    rows::{
        GatewayRow, HotspotDetailsRow, MakerRow, PlacedGatewayRow, GATEWAY_COLUMNS, PLACE_COLUMNS,
    },
};
use crate::models::{
    ActivityResponse, AvgBeacons, GeoCode, Hotspot, HotspotDetails, HotspotSearch,
    HotspotStatusEntry, Location, Maker, RewardsResponse, SingleHotspot, HOTSPOT_DATA_TYPE,
    PAGE_SIZE,
};
use crate::rewards::{RewardSeries, SECONDS_PER_DAY};
use crate::status::{ActivityStatus, StatusResolver};

/// Activity entries per page
pub const ACTIVITY_PAGE_SIZE: i64 = 5;

const WEEK_SECS: i64 = 7 * SECONDS_PER_DAY;

const ACTIVITY_SQL: &str = r#"
    SELECT ta.actor_role::TEXT AS actor_role,
           t.hash::TEXT AS hash,
           COALESCE(t.time, 0)::BIGINT AS time,
           COALESCE(t.block, 0)::BIGINT AS block,
           COALESCE(t.fields::TEXT, '') AS fields
    FROM transaction_actors ta
    INNER JOIN transactions t ON ta.transaction_hash = t.hash
"#;

/// Hotspot listings, details, activity, rewards and the nested lookups they share
#[derive(Clone)]
pub struct HotspotService {
    ctx: LedgerContext,
    status: StatusResolver,
}

impl HotspotService {
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            status: StatusResolver::new(ctx.clone()),
            ctx,
        }
    }

    /// Newest hotspots first, [`PAGE_SIZE`] per page.
    pub async fn list(&self, page: i64) -> Vec<Hotspot> {
        let offset = page * PAGE_SIZE;
        let key = format!("{}{offset}", keys::HOTSPOTS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let sql = format!(
                    "SELECT {GATEWAY_COLUMNS}, {PLACE_COLUMNS}
                     FROM gateway_inventory h
                     INNER JOIN locations l ON l.location = h.location
                     ORDER BY h.first_block DESC
                     LIMIT $1 OFFSET $2"
                );
                let rows: Vec<PlacedGatewayRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(PAGE_SIZE).bind(offset),
                    "hotspot_list",
                )
                .await;

                let mut hotspots = Vec::with_capacity(rows.len());
                for row in rows {
                    let location = row.place.into_location(row.gateway.location.clone());
                    let hotspot = row.gateway.into_hotspot(location);
                    hotspots.push(self.attribute(hotspot).await);
                }
                hotspots
            })
            .await
    }

    /// Single hotspot wrapped in a list; empty when the address is unknown.
    pub async fn single(&self, hash: &str) -> Vec<SingleHotspot> {
        let key = format!("{}{hash}", keys::HOTSPOT);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let Some(row) = self.gateway(hash).await else {
                    return Vec::new();
                };

                let location = self.location(&row.location).await;
                let maker = self.maker(hash).await;
                let witness_count = self.witness_count(hash).await;
                let status = self.status.resolve(hash).await;

                vec![SingleHotspot {
                    data_type: HOTSPOT_DATA_TYPE.to_string(),
                    address: row.address,
                    name: row.name,
                    owner: row.owner,
                    location,
                    last_poc_challenge: row.last_poc_challenge,
                    first_block: row.first_block,
                    last_block: row.last_block,
                    first_timestamp: row.first_timestamp,
                    nonce: row.nonce,
                    reward_scale: row.reward_scale,
                    elevation: row.elevation,
                    gain: row.gain,
                    maker: maker.name,
                    payer: row.payer,
                    witness_count,
                    active: status.active,
                    activity_timestamp: status.timestamp,
                    activity_tx: status.tx,
                }]
            })
            .await
    }

    /// Hotspots owned by a wallet, with place names resolved and maker taken
    /// from the payer. Status is not resolved for owner listings.
    pub async fn owned_by(&self, owner: &str) -> Vec<Hotspot> {
        let key = format!("{}{owner}", keys::WALLET_HOTSPOTS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                let sql = format!(
                    "SELECT {GATEWAY_COLUMNS} FROM gateway_inventory h WHERE h.owner = $1"
                );
                let rows: Vec<GatewayRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(owner),
                    "wallet_hotspots",
                )
                .await;

                let mut hotspots = Vec::with_capacity(rows.len());
                for row in rows {
                    let location = self.location(&row.location).await;
                    let maker = self.payer_maker(&row.payer).await;
                    let mut hotspot = row.into_hotspot(location);
                    hotspot.maker = maker.name;
                    hotspots.push(hotspot);
                }
                hotspots
            })
            .await
    }

    /// Joined inventory, status and assertion data; `None` for unknown hotspots.
    pub async fn details(&self, hash: &str) -> Option<HotspotDetails> {
        let key = format!("{}{hash}", keys::HOTSPOT_DETAILS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_HOUR, move || async move {
                let row = db::fetch_optional::<HotspotDetailsRow>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT gi.address::TEXT AS address,
                               COALESCE(gi.owner, '')::TEXT AS owner,
                               COALESCE(gi.name, '')::TEXT AS name,
                               COALESCE(gi.location, '')::TEXT AS location,
                               COALESCE(gs.block, 0)::BIGINT AS block_height,
                               COALESCE(gi.first_block, 0)::BIGINT AS block_added,
                               COALESCE(gi.last_poc_challenge, 0)::BIGINT AS last_poc_challenge,
                               COALESCE(gi.nonce, 0)::BIGINT AS nonce,
                               COALESCE(gi.reward_scale, 0)::DOUBLE PRECISION AS reward_scale,
                               COALESCE(gi.elevation, 0)::BIGINT AS elevation,
                               COALESCE(gi.gain, 0)::BIGINT AS gain,
                               COALESCE(EXTRACT(EPOCH FROM gi.first_timestamp), 0)::BIGINT AS timestamp_added,
                               COALESCE(EXTRACT(EPOCH FROM gs.updated_at), 0)::BIGINT AS last_update,
                               COALESCE(gab.timestamp, 0)::BIGINT AS last_assertion,
                               COALESCE(gi.payer, '')::TEXT AS payer,
                               COALESCE(gi.mode, '')::TEXT AS mode
                        FROM gateway_inventory gi
                        INNER JOIN gateway_status gs ON gi.address = gs.address
                        INNER JOIN gateway_assertion_blocks gab ON gi.address = gab.address
                        WHERE gi.address = $1
                        "#,
                    )
                    .bind(hash),
                    "hotspot_details",
                )
                .await?;

                let place = self.geolocation(&row.location).await.place();
                let maker = self.maker(hash).await;
                let status = self.status.resolve(hash).await;

                Some(HotspotDetails {
                    data_type: HOTSPOT_DATA_TYPE.to_string(),
                    address: row.address,
                    block_height: row.block_height,
                    block_added: row.block_added,
                    place,
                    last_poc_challenge: row.last_poc_challenge,
                    location: row.location,
                    name: row.name,
                    nonce: row.nonce,
                    owner: row.owner,
                    reward_scale: row.reward_scale,
                    timestamp_added: row.timestamp_added,
                    elevation: row.elevation,
                    gain: row.gain,
                    last_update: row.last_update,
                    entity: HOTSPOT_DATA_TYPE.to_string(),
                    last_assertion: row.last_assertion,
                    payer: row.payer,
                    mode: row.mode,
                    maker: maker.name,
                    active: status.active,
                    activity_timestamp: status.timestamp,
                    activity_tx: status.tx,
                })
            })
            .await
    }

    /// One page of decoded activity, newest block first.
    pub async fn activities(&self, hash: &str, page: i64) -> ActivityResponse {
        let offset = page * ACTIVITY_PAGE_SIZE;
        let key = format!("{}{hash}-{offset}", keys::HOTSPOT_ACTIVITY);

        let activity = self
            .ctx
            .cache
            .get_or_compute(&key, TTL_ACTIVITY, move || async move {
                let sql = format!(
                    "{ACTIVITY_SQL} WHERE ta.actor = $1 ORDER BY ta.block DESC LIMIT $2 OFFSET $3"
                );
                let rows: Vec<RawTransactionRecord> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql)
                        .bind(hash)
                        .bind(ACTIVITY_PAGE_SIZE)
                        .bind(offset),
                    "hotspot_activity",
                )
                .await;

                debug!(hotspot = %hash, rows = rows.len(), "decoding activity page");
                decode_activity(&rows, hash, self).await
            })
            .await;

        ActivityResponse {
            limit: ACTIVITY_PAGE_SIZE,
            page,
            activity,
        }
    }

    /// Proof-of-coverage participations over the last seven days.
    pub async fn avg_beacons(&self, hash: &str) -> AvgBeacons {
        let key = format!("{}{hash}", keys::HOTSPOT_BEACONS);

        let beacons = self
            .ctx
            .cache
            .get_or_compute(&key, TTL_DAY, move || async move {
                let since = Utc::now().timestamp() - WEEK_SECS;
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        r#"
                        SELECT COUNT(*)::BIGINT
                        FROM transaction_actors ta
                        INNER JOIN transactions t ON ta.transaction_hash = t.hash
                        WHERE ta.actor = $1
                          AND ta.actor_role IN ('challengee', 'challenger', 'witness')
                          AND t.time > $2
                        "#,
                    )
                    .bind(hash)
                    .bind(since),
                    "avg_beacons",
                )
                .await
            })
            .await;

        AvgBeacons { beacons }
    }

    pub async fn status(&self, hash: &str) -> ActivityStatus {
        self.status.resolve(hash).await
    }

    /// Statuses in request order.
    pub async fn statuses(&self, hotspots: &[String]) -> Vec<HotspotStatusEntry> {
        let mut entries = Vec::with_capacity(hotspots.len());
        for hotspot in hotspots {
            entries.push(HotspotStatusEntry {
                hotspot_id: hotspot.clone(),
                active: self.status.resolve(hotspot).await,
            });
        }
        entries
    }

    pub async fn rewards(&self, hash: &str, days: i64) -> RewardsResponse {
        let key = format!("{}{hash}-{days}", keys::HOTSPOT_REWARDS);

        let rewards = self
            .ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                reward_series(&self.ctx.pool, RewardOwner::Gateway, hash, days).await
            })
            .await;

        RewardsResponse {
            days,
            rewards,
            rewards_24h: self.rewards_24h(hash).await,
        }
    }

    pub async fn rewards_24h(&self, hash: &str) -> RewardSeries {
        let key = format!("{}{hash}", keys::HOTSPOT_REWARDS_24H);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                rewards_since_yesterday(&self.ctx.pool, RewardOwner::Gateway, hash).await
            })
            .await
    }

    /// Distinct beaconers this hotspot validly witnessed in the last seven days.
    pub async fn witness_count(&self, hash: &str) -> i64 {
        let key = format!("{}{hash}", keys::HOTSPOT_WITNESS_COUNT);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_HOUR, move || async move {
                let since = Utc::now().timestamp() - WEEK_SECS;
                let sql = format!(
                    "{ACTIVITY_SQL} WHERE ta.actor = $1 AND ta.actor_role = 'witness' AND t.time >= $2"
                );
                let rows: Vec<RawTransactionRecord> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(hash).bind(since),
                    "witness_count",
                )
                .await;

                count_witnessed_beaconers(&rows, hash) as i64
            })
            .await
    }

    pub async fn search_by_name(&self, query: &str) -> Vec<HotspotSearch> {
        let key = format!("{}{query}", keys::SEARCH_HOTSPOTS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_SEARCH, move || async move {
                let patterns = name_patterns(query);
                if patterns.is_empty() {
                    return Vec::new();
                }

                let sql = format!(
                    "SELECT {GATEWAY_COLUMNS}, {PLACE_COLUMNS}
                     FROM gateway_inventory h
                     INNER JOIN locations l ON l.location = h.location
                     WHERE h.name LIKE ALL($1)
                       AND h.address IS NOT NULL
                       AND h.owner IS NOT NULL
                       AND h.first_timestamp IS NOT NULL"
                );
                let rows: Vec<PlacedGatewayRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(patterns),
                    "hotspot_name_search",
                )
                .await;

                rows.into_iter().map(HotspotSearch::from).collect()
            })
            .await
    }

    /// Reverse-geocoded place names of a cell; empty parts when unknown.
    pub async fn geolocation(&self, index: &str) -> GeoCode {
        if index.is_empty() {
            return GeoCode::default();
        }
        let key = format!("{}{index}", keys::GEOLOCATION);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_HOUR, move || async move {
                db::fetch_optional::<GeoCode>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT COALESCE(long_street, '')::TEXT AS long_street,
                               COALESCE(short_street, '')::TEXT AS short_street,
                               COALESCE(long_city, '')::TEXT AS long_city,
                               COALESCE(short_city, '')::TEXT AS short_city,
                               COALESCE(long_state, '')::TEXT AS long_state,
                               COALESCE(short_state, '')::TEXT AS short_state,
                               COALESCE(long_country, '')::TEXT AS long_country,
                               COALESCE(short_country, '')::TEXT AS short_country,
                               COALESCE(city_id, '')::TEXT AS city_id
                        FROM locations
                        WHERE location = $1
                        "#,
                    )
                    .bind(index),
                    "geolocation",
                )
                .await
                .unwrap_or_default()
            })
            .await
    }

    /// Maker of a hotspot, through the hotspot's payer.
    pub async fn maker(&self, hash: &str) -> Maker {
        let key = format!("{}{hash}", keys::HOTSPOT_MAKER);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_DAY, move || async move {
                let row = db::fetch_optional::<MakerRow>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT COALESCE(m.name, '')::TEXT AS name,
                               COALESCE(m.address, '')::TEXT AS address
                        FROM makers m
                        INNER JOIN gateway_inventory g ON g.payer = m.address
                        WHERE g.address = $1
                        "#,
                    )
                    .bind(hash),
                    "hotspot_maker",
                )
                .await;

                maker_from(row)
            })
            .await
    }

    /// Maker registered under a payer address.
    pub async fn payer_maker(&self, payer: &str) -> Maker {
        if payer.is_empty() {
            return Maker::default();
        }
        let key = format!("{}{payer}", keys::PAYER_MAKER);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_DAY, move || async move {
                let row = db::fetch_optional::<MakerRow>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT COALESCE(m.name, '')::TEXT AS name,
                               COALESCE(m.address, '')::TEXT AS address
                        FROM makers m
                        WHERE m.address = $1
                        "#,
                    )
                    .bind(payer),
                    "payer_maker",
                )
                .await;

                maker_from(row)
            })
            .await
    }

    async fn gateway(&self, hash: &str) -> Option<GatewayRow> {
        let sql = format!("SELECT {GATEWAY_COLUMNS} FROM gateway_inventory h WHERE h.address = $1");
        db::fetch_optional(&self.ctx.pool, sqlx::query(&sql).bind(hash), "gateway").await
    }

    async fn location(&self, index: &str) -> Location {
        let geo = self.geolocation(index).await;
        Location {
            location: index.to_string(),
            country: geo.long_country,
            short_country: geo.short_country,
            city: geo.long_city,
            street: geo.long_street,
        }
    }

    /// Fill maker and activity status of a listing entry.
    async fn attribute(&self, mut hotspot: Hotspot) -> Hotspot {
        let maker = self.maker(&hotspot.address).await;
        hotspot.maker = maker.name;
        if !maker.payer.is_empty() {
            hotspot.payer = maker.payer;
        }

        let status = self.status.resolve(&hotspot.address).await;
        hotspot.active = status.active;
        hotspot.activity_timestamp = status.timestamp;
        hotspot.activity_tx = status.tx;
        hotspot
    }
}

#[async_trait]
impl HotspotDirectory for HotspotService {
    async fn locate(&self, address: &str) -> HotspotLocation {
        match self.details(address).await {
            Some(details) => HotspotLocation {
                location: details.location,
                place: details.place,
            },
            None => HotspotLocation::default(),
        }
    }
}

fn maker_from(row: Option<MakerRow>) -> Maker {
    match row {
        Some(row) if !row.name.is_empty() => Maker {
            name: row.name,
            payer: row.address,
        },
        _ => Maker::default(),
    }
}

/// Distinct beaconers whose beacon `subject` witnessed validly.
fn count_witnessed_beaconers(rows: &[RawTransactionRecord], subject: &str) -> usize {
    let mut beaconers = HashSet::new();

    for row in rows {
        let Ok(ActivityPayload::Witness(report)) =
            ActivityPayload::parse(ActorRole::Witness, &row.fields)
        else {
            continue;
        };

        let witnessed = report
            .path
            .witnesses
            .iter()
            .any(|witness| witness.gateway == subject && witness.is_valid);
        if witnessed {
            beaconers.insert(report.path.challengee);
        }
    }

    beaconers.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn witness_row(beaconer: &str, witnesses: &str) -> RawTransactionRecord {
        RawTransactionRecord {
            actor_role: "witness".into(),
            hash: format!("tx-{beaconer}"),
            time: 1_700_000_000,
            block: 100,
            fields: format!(
                r#"{{"challenger":"c","path":[{{"challengee":"{beaconer}","witnesses":{witnesses}}}]}}"#
            ),
        }
    }

    #[test]
    fn counts_each_beaconer_once() {
        let valid = r#"[{"gateway":"me","is_valid":true}]"#;
        let rows = vec![
            witness_row("b1", valid),
            witness_row("b1", valid),
            witness_row("b2", valid),
        ];

        assert_eq!(count_witnessed_beaconers(&rows, "me"), 2);
    }

    #[test]
    fn invalid_or_foreign_witnesses_do_not_count() {
        let rows = vec![
            witness_row("b1", r#"[{"gateway":"me","is_valid":false}]"#),
            witness_row("b2", r#"[{"gateway":"other","is_valid":true}]"#),
            RawTransactionRecord {
                fields: "garbage".into(),
                ..witness_row("b3", "[]")
            },
        ];

        assert_eq!(count_witnessed_beaconers(&rows, "me"), 0);
    }

    #[test]
    fn empty_maker_name_is_no_maker() {
        let row = MakerRow {
            name: String::new(),
            address: "payer".into(),
        };
        assert_eq!(maker_from(Some(row)), Maker::default());

        let row = MakerRow {
            name: "Acme".into(),
            address: "payer".into(),
        };
        assert_eq!(
            maker_from(Some(row)),
            Maker {
                name: "Acme".into(),
                payer: "payer".into()
            }
        );
    }
}
