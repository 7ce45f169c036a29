use serde::{Deserialize, Serialize};

use super::payload::null_default;

/// One witness of a beacon, as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessObservation {
    #[serde(rename = "hash")]
    pub gateway: String,
    #[serde(rename = "distance")]
    pub distance_meters: i64,
    pub datarate: String,
    pub rssi: i64,
    pub snr: f64,
    pub frequency: f64,
    #[serde(rename = "valid")]
    pub is_valid: bool,
    pub timestamp: i64,
    pub channel: i64,
    #[serde(rename = "location")]
    pub resolved_place: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invalid_reason: String,
}

/// The subject witnessed someone else's beacon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessActivity {
    pub hash: String,
    pub time: i64,
    pub block: i64,
    pub distance: i64,
    pub challenger: String,
    pub challenger_location: String,
    pub beaconer: String,
    pub beaconer_location: String,
    pub valid: bool,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub witnesses: Vec<WitnessObservation>,
}

/// The subject issued a challenge, or beaconed in answer to one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeActivity {
    pub hash: String,
    pub time: i64,
    pub block: i64,
    pub challenger: String,
    pub challenger_location: String,
    pub beaconer: String,
    pub beaconer_location: String,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub witnesses: Vec<WitnessObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardActivity {
    pub hash: String,
    pub time: i64,
    pub block: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPacketActivity {
    pub hash: String,
    pub time: i64,
    pub block: i64,
    pub num_dcs: i64,
    pub location: String,
    pub num_packets: i64,
}

/// Gateway add or location assertion, decoded straight from the payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayActivity {
    #[serde(default, deserialize_with = "null_default")]
    pub fee: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub gain: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub hash: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_default")]
    pub nonce: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_default")]
    pub payer: String,
    #[serde(default, deserialize_with = "null_default")]
    pub gateway: String,
    #[serde(default, deserialize_with = "null_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_default")]
    pub elevation: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub staking_fee: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub timestamp: i64,
}

/// Every sequence is always present, possibly empty, including after a cache
/// round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityBundle {
    #[serde(default)]
    pub witnesses: Vec<WitnessActivity>,
    #[serde(default)]
    pub challengers: Vec<ChallengeActivity>,
    #[serde(default)]
    pub challengees: Vec<ChallengeActivity>,
    #[serde(default)]
    pub rewards: Vec<RewardActivity>,
    #[serde(default)]
    pub data_packets: Vec<DataPacketActivity>,
    #[serde(default)]
    pub gateway_data: Vec<GatewayActivity>,
}
