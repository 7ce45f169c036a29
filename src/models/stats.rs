use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Homepage overview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hotspots: HotspotTotals,
    pub hnt_price: HntPrice,
    pub block: BlockHeight,
    pub dc_spent: i64,
    pub validator: ValidatorStats,
    pub challenges: i64,
    pub oui_count: i64,
    pub countries: i64,
    pub cities: i64,
    pub circulating_supply: f64,
    pub market_cap: i64,
    pub market_cap_rank: i64,
    pub last_hotspot: LastHotspot,
    pub last_maker: LastMaker,
}

/// Counters kept in the `stats_inventory` name/value table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsInventory {
    pub blocks: i64,
    pub challenges: i64,
    pub cities: i64,
    pub coingecko_price_eur: i64,
    pub coingecko_price_gbp: i64,
    pub coingecko_price_usd: i64,
    pub consensus_groups: i64,
    pub countries: i64,
    pub hotspots: i64,
    pub hotspots_dataonly: i64,
    pub hotspots_online: i64,
    pub ouis: i64,
    pub transactions: i64,
    pub validators: i64,
}

impl StatsInventory {
    /// Unknown names are ignored.
    pub fn apply(&mut self, name: &str, value: i64) {
        let slot = match name {
            "blocks" => &mut self.blocks,
            "challenges" => &mut self.challenges,
            "cities" => &mut self.cities,
            "coingecko_price_eur" => &mut self.coingecko_price_eur,
            "coingecko_price_gbp" => &mut self.coingecko_price_gbp,
            "coingecko_price_usd" => &mut self.coingecko_price_usd,
            "consensus_groups" => &mut self.consensus_groups,
            "countries" => &mut self.countries,
            "hotspots" => &mut self.hotspots,
            "hotspots_dataonly" => &mut self.hotspots_dataonly,
            "hotspots_online" => &mut self.hotspots_online,
            "ouis" => &mut self.ouis,
            "transactions" => &mut self.transactions,
            "validators" => &mut self.validators,
            _ => return,
        };
        *slot = value;
    }
}

/// Chain variables kept in the `vars_inventory` name/value table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarsInventory {
    pub block_time: i64,
    pub dc_payload_size: i64,
    pub monthly_rewards: i64,
    pub consensus_number: i64,
    pub stake_withdraw_cooldown: i64,
    pub validator_minimum_stake: i64,
}

impl VarsInventory {
    /// Values are stored as text; anything that is not an integer reads as 0.
    pub fn apply(&mut self, name: &str, value: &str) {
        let slot = match name {
            "block_time" => &mut self.block_time,
            "dc_payload_size" => &mut self.dc_payload_size,
            "monthly_rewards" => &mut self.monthly_rewards,
            "num_consensus_members" => &mut self.consensus_number,
            "stake_withdrawal_cooldown" => &mut self.stake_withdraw_cooldown,
            "validator_minimum_stake" => &mut self.validator_minimum_stake,
            _ => return,
        };
        *slot = value.trim().parse().unwrap_or_default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorStats {
    pub count: i64,
    pub consensus_number: i64,
    pub stake_withdraw_cooldown: i64,
    pub validator_minimum_stake: i64,
    pub online: i64,
    pub versions: BTreeMap<i64, i64>,
    pub apr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotTotals {
    pub total: i64,
    pub online: i64,
    pub trend: HotspotTrend,
}

/// Cumulative hotspot count per day over the last 30 days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotTrend {
    pub last_days: BTreeMap<String, i64>,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HntPrice {
    pub price: f64,
    pub percentage: f64,
    pub oracle: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeight {
    pub height: i64,
    pub change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastHotspot {
    pub hash: String,
    pub name: String,
    pub location: String,
    pub country: String,
    pub short_country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LastMaker {
    pub count: i64,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OraclePrices {
    pub min: f64,
    pub max: f64,
    pub prices: BTreeMap<i64, f64>,
}

/// Subset of the price-feed coin document the overview uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub market_cap_rank: i64,
    #[serde(default)]
    pub market_data: MarketData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: UsdQuote<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: f64,
    #[serde(default)]
    pub circulating_supply: f64,
    #[serde(default)]
    pub market_cap: UsdQuote<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote<T> {
    #[serde(default)]
    pub usd: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventories_pick_known_names() {
        let mut stats = StatsInventory::default();
        stats.apply("blocks", 1_200_000);
        stats.apply("hotspots_online", 42);
        stats.apply("something_else", 7);
        assert_eq!(stats.blocks, 1_200_000);
        assert_eq!(stats.hotspots_online, 42);

        let mut vars = VarsInventory::default();
        vars.apply("num_consensus_members", "16");
        vars.apply("block_time", "not a number");
        assert_eq!(vars.consensus_number, 16);
        assert_eq!(vars.block_time, 0);
    }

    #[test]
    fn market_snapshot_tolerates_partial_documents() {
        let snapshot: MarketSnapshot = serde_json::from_str(
            r#"{"market_cap_rank":61,"market_data":{"current_price":{"usd":7.5,"eur":7.0}}}"#,
        )
        .unwrap();

        assert_eq!(snapshot.market_cap_rank, 61);
        assert_eq!(snapshot.market_data.current_price.usd, 7.5);
        assert_eq!(snapshot.market_data.market_cap.usd, 0);
    }
}
