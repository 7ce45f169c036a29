use serde::{Deserialize, Serialize};

use crate::rewards::RewardSeries;

pub const VALIDATOR_DATA_TYPE: &str = "validator";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub data_type: String,
    pub address: String,
    pub owner: String,
    pub name: String,
    pub online: String,
    pub version_heartbeat: i64,
    pub last_heartbeat: i64,
    pub staked: String,
    pub penalty_score: f64,
}

impl Validator {
    pub fn is_staked(&self) -> bool {
        self.staked == "staked"
    }

    pub fn is_online(&self) -> bool {
        self.online == "online"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub height: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleValidator {
    pub data_type: String,
    pub address: String,
    pub owner: String,
    pub name: String,
    pub online: String,
    pub version_heartbeat: i64,
    pub last_heartbeat: i64,
    pub staked: String,
    pub rewards: RewardSeries,
    pub rewards_24h: RewardSeries,
    pub penalty_score: f64,
    pub penalties: Vec<Penalty>,
}
