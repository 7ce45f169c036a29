//! Row shapes read from the ledger tables
//!
//! Every nullable column is coalesced in SQL, so these structs carry plain
//! values and a missing column decodes as an error instead of a silent zero.

use sqlx::FromRow;

use crate::models::{
    Hotspot, HotspotSearch, LastHotspot, Location, Validator, WalletBalance, HOTSPOT_DATA_TYPE,
    VALIDATOR_DATA_TYPE,
};

/// Inventory columns of `gateway_inventory` aliased as `h`
pub const GATEWAY_COLUMNS: &str = r#"
    h.address::TEXT AS address,
    COALESCE(h.name, '')::TEXT AS name,
    COALESCE(h.owner, '')::TEXT AS owner,
    COALESCE(h.location, '')::TEXT AS location,
    COALESCE(h.last_poc_challenge, 0)::BIGINT AS last_poc_challenge,
    COALESCE(h.first_block, 0)::BIGINT AS first_block,
    COALESCE(h.last_block, 0)::BIGINT AS last_block,
    COALESCE(EXTRACT(EPOCH FROM h.first_timestamp), 0)::BIGINT AS first_timestamp,
    COALESCE(h.nonce, 0)::BIGINT AS nonce,
    COALESCE(h.reward_scale, 0)::DOUBLE PRECISION AS reward_scale,
    COALESCE(h.elevation, 0)::BIGINT AS elevation,
    COALESCE(h.gain, 0)::BIGINT AS gain,
    COALESCE(h.payer, '')::TEXT AS payer
"#;

/// Place columns of `locations` aliased as `l`
pub const PLACE_COLUMNS: &str = r#"
    COALESCE(l.long_country, '')::TEXT AS long_country,
    COALESCE(l.short_country, '')::TEXT AS short_country,
    COALESCE(l.long_city, '')::TEXT AS long_city,
    COALESCE(l.long_street, '')::TEXT AS long_street
"#;

/// Validator columns of `validator_inventory i JOIN validator_status s`
pub const VALIDATOR_COLUMNS: &str = r#"
    i.address::TEXT AS address,
    COALESCE(i.name, '')::TEXT AS name,
    COALESCE(i.owner, '')::TEXT AS owner,
    COALESCE(s.online, '')::TEXT AS online,
    COALESCE(i.version_heartbeat, 0)::BIGINT AS version_heartbeat,
    COALESCE(i.last_heartbeat, 0)::BIGINT AS last_heartbeat,
    COALESCE(i.status, '')::TEXT AS staked,
    COALESCE(i.penalty, 0)::DOUBLE PRECISION AS penalty,
    COALESCE(i.penalties::TEXT, '[]') AS penalties
"#;

#[derive(Debug, Clone, Default, FromRow)]
pub struct GatewayRow {
    pub address: String,
    pub name: String,
    pub owner: String,
    pub location: String,
    pub last_poc_challenge: i64,
    pub first_block: i64,
    pub last_block: i64,
    pub first_timestamp: i64,
    pub nonce: i64,
    pub reward_scale: f64,
    pub elevation: i64,
    pub gain: i64,
    pub payer: String,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct PlaceRow {
    pub long_country: String,
    pub short_country: String,
    pub long_city: String,
    pub long_street: String,
}

impl PlaceRow {
    pub fn into_location(self, location: String) -> Location {
        Location {
            location,
            country: self.long_country,
            short_country: self.short_country,
            city: self.long_city,
            street: self.long_street,
        }
    }
}

/// Gateway joined with its location's place names
#[derive(Debug, Clone, Default, FromRow)]
pub struct PlacedGatewayRow {
    #[sqlx(flatten)]
    pub gateway: GatewayRow,
    #[sqlx(flatten)]
    pub place: PlaceRow,
}

impl GatewayRow {
    /// Listing entry with maker and status left for the caller to fill.
    pub fn into_hotspot(self, location: Location) -> Hotspot {
        Hotspot {
            data_type: HOTSPOT_DATA_TYPE.to_string(),
            address: self.address,
            name: self.name,
            owner: self.owner,
            location,
            last_poc_challenge: self.last_poc_challenge,
            first_block: self.first_block,
            last_block: self.last_block,
            first_timestamp: self.first_timestamp,
            nonce: self.nonce,
            reward_scale: self.reward_scale,
            elevation: self.elevation,
            gain: self.gain,
            maker: String::new(),
            payer: self.payer,
            active: false,
            activity_timestamp: 0,
            activity_tx: String::new(),
        }
    }
}

impl From<PlacedGatewayRow> for HotspotSearch {
    fn from(row: PlacedGatewayRow) -> Self {
        let gateway = row.gateway;
        let location = row.place.into_location(gateway.location);

        Self {
            data_type: HOTSPOT_DATA_TYPE.to_string(),
            address: gateway.address,
            name: gateway.name,
            owner: gateway.owner,
            location,
            last_poc_challenge: gateway.last_poc_challenge,
            first_block: gateway.first_block,
            last_block: gateway.last_block,
            first_timestamp: gateway.first_timestamp,
            nonce: gateway.nonce,
            reward_scale: gateway.reward_scale,
            elevation: gateway.elevation,
            gain: gateway.gain,
        }
    }
}

/// Inventory, status and last assertion of one gateway
#[derive(Debug, Clone, FromRow)]
pub struct HotspotDetailsRow {
    pub address: String,
    pub owner: String,
    pub name: String,
    pub location: String,
    pub block_height: i64,
    pub block_added: i64,
    pub last_poc_challenge: i64,
    pub nonce: i64,
    pub reward_scale: f64,
    pub elevation: i64,
    pub gain: i64,
    pub timestamp_added: i64,
    pub last_update: i64,
    pub last_assertion: i64,
    pub payer: String,
    pub mode: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MakerRow {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyCountRow {
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct LastHotspotRow {
    pub address: String,
    pub name: String,
    pub location: String,
    pub long_country: String,
    pub short_country: String,
}

impl From<LastHotspotRow> for LastHotspot {
    fn from(row: LastHotspotRow) -> Self {
        Self {
            hash: row.address,
            name: row.name,
            location: row.location,
            country: row.long_country,
            short_country: row.short_country,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub address: String,
    pub block: i64,
    pub balance: i64,
    pub dc_balance: i64,
    pub security_balance: i64,
    pub staked_balance: i64,
    pub mobile_balance: i64,
    pub iot_balance: i64,
}

impl AccountRow {
    pub fn balance(&self) -> WalletBalance {
        WalletBalance {
            hst: self.security_balance,
            dc: self.dc_balance,
            hnt: self.balance,
            stake: self.staked_balance,
            mobile: self.mobile_balance,
            iot: self.iot_balance,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ValidatorRow {
    pub address: String,
    pub name: String,
    pub owner: String,
    pub online: String,
    pub version_heartbeat: i64,
    pub last_heartbeat: i64,
    pub staked: String,
    pub penalty: f64,
    pub penalties: String,
}

impl From<ValidatorRow> for Validator {
    fn from(row: ValidatorRow) -> Self {
        Self {
            data_type: VALIDATOR_DATA_TYPE.to_string(),
            address: row.address,
            owner: row.owner,
            name: row.name,
            online: row.online,
            version_heartbeat: row.version_heartbeat,
            last_heartbeat: row.last_heartbeat,
            staked: row.staked,
            penalty_score: row.penalty,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub block: i64,
    pub hash: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub time: i64,
    pub fields: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct NamedValueRow {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct NamedCountRow {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct OraclePriceRow {
    pub price: i64,
    pub time: i64,
}
