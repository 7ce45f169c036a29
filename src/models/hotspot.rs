use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::activity::ActivityBundle;
use crate::rewards::RewardSeries;
use crate::status::ActivityStatus;

pub const HOTSPOT_DATA_TYPE: &str = "hotspot";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location: String,
    pub country: String,
    pub short_country: String,
    pub city: String,
    pub street: String,
}

/// Hotspot entry in paged and per-wallet listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub data_type: String,
    pub address: String,
    pub name: String,
    pub owner: String,
    pub location: Location,
    pub last_poc_challenge: i64,
    pub first_block: i64,
    pub last_block: i64,
    pub first_timestamp: i64,
    pub nonce: i64,
    pub reward_scale: f64,
    pub elevation: i64,
    pub gain: i64,
    pub maker: String,
    pub payer: String,
    pub active: bool,
    pub activity_timestamp: i64,
    pub activity_tx: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleHotspot {
    pub data_type: String,
    pub address: String,
    pub name: String,
    pub owner: String,
    pub location: Location,
    pub last_poc_challenge: i64,
    pub first_block: i64,
    pub last_block: i64,
    pub first_timestamp: i64,
    pub nonce: i64,
    pub reward_scale: f64,
    pub elevation: i64,
    pub gain: i64,
    pub maker: String,
    pub payer: String,
    pub witness_count: i64,
    pub active: bool,
    pub activity_timestamp: i64,
    pub activity_tx: String,
}

/// Name-search hit; carries no maker or status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotSearch {
    pub data_type: String,
    pub address: String,
    pub name: String,
    pub owner: String,
    pub location: Location,
    pub last_poc_challenge: i64,
    pub first_block: i64,
    pub last_block: i64,
    pub first_timestamp: i64,
    pub nonce: i64,
    pub reward_scale: f64,
    pub elevation: i64,
    pub gain: i64,
}

/// Joined inventory, status and assertion data for one hotspot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotDetails {
    pub data_type: String,
    pub address: String,
    pub block_height: i64,
    pub block_added: i64,
    pub place: String,
    pub last_poc_challenge: i64,
    pub location: String,
    pub name: String,
    pub nonce: i64,
    pub owner: String,
    pub reward_scale: f64,
    pub timestamp_added: i64,
    pub elevation: i64,
    pub gain: i64,
    pub last_update: i64,
    pub entity: String,
    pub last_assertion: i64,
    pub payer: String,
    pub mode: String,
    pub maker: String,
    pub active: bool,
    pub activity_timestamp: i64,
    pub activity_tx: String,
}

/// Reverse-geocoded components of a cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GeoCode {
    pub short_street: String,
    pub short_state: String,
    pub short_country: String,
    pub short_city: String,
    pub long_street: String,
    pub long_state: String,
    pub long_country: String,
    pub long_city: String,
    pub city_id: String,
}

impl GeoCode {
    pub const UNKNOWN_PLACE: &'static str = "Unknown location";

    /// `"<long city>, <short state>, <long country>"` from whichever parts are known.
    pub fn place(&self) -> String {
        let parts: Vec<&str> = [
            self.long_city.as_str(),
            self.short_state.as_str(),
            self.long_country.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            Self::UNKNOWN_PLACE.to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maker {
    pub name: String,
    pub payer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub limit: i64,
    pub page: i64,
    pub activity: ActivityBundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsResponse {
    pub days: i64,
    pub rewards: RewardSeries,
    pub rewards_24h: RewardSeries,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvgBeacons {
    #[serde(rename = "7d_average_beacons")]
    pub beacons: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MultiStatusRequest {
    #[validate(length(min = 1, max = 500))]
    pub hotspots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotStatusEntry {
    pub hotspot_id: String,
    pub active: ActivityStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_joins_known_parts() {
        let geo = GeoCode {
            long_city: "Lisbon".into(),
            long_country: "Portugal".into(),
            ..Default::default()
        };
        assert_eq!(geo.place(), "Lisbon, Portugal");

        let full = GeoCode {
            long_city: "Austin".into(),
            short_state: "TX".into(),
            long_country: "United States".into(),
            ..Default::default()
        };
        assert_eq!(full.place(), "Austin, TX, United States");
    }

    #[test]
    fn empty_geocode_is_unknown() {
        assert_eq!(GeoCode::default().place(), "Unknown location");
    }

    #[test]
    fn multi_status_body_bounds() {
        let empty = MultiStatusRequest { hotspots: vec![] };
        assert!(empty.validate().is_err());

        let ok = MultiStatusRequest {
            hotspots: vec!["a".into()],
        };
        assert!(ok.validate().is_ok());

        let too_many = MultiStatusRequest {
            hotspots: vec!["a".into(); 501],
        };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn avg_beacons_key_starts_with_digit() {
        let json = serde_json::to_string(&AvgBeacons { beacons: 12 }).unwrap();
        assert_eq!(json, r#"{"7d_average_beacons":12}"#);
    }
}
