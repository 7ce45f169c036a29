use serde::{Deserialize, Serialize};

use crate::rewards::RewardSeries;

pub const WALLET_DATA_TYPE: &str = "wallet";

/// Balances of the latest account snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub hst: i64,
    pub dc: i64,
    pub hnt: i64,
    pub stake: i64,
    pub mobile: i64,
    pub iot: i64,
}

impl WalletBalance {
    /// Marker for an address with no account row
    pub const UNKNOWN: Self = Self {
        hst: -1,
        dc: -1,
        hnt: -1,
        stake: -1,
        mobile: -1,
        iot: -1,
    };

    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub data_type: String,
    pub address: String,
    pub hotspot_count: i64,
    pub balance: WalletBalance,
    pub rewards: RewardSeries,
    pub rewards_24h: RewardSeries,
    pub validator_count: i64,
    pub last_block: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletList {
    pub data_type: String,
    pub address: String,
    pub hotspot_count: i64,
    pub validator_count: i64,
    pub balance: WalletBalance,
    pub last_block: i64,
}
