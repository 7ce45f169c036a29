use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const BLOCK_DATA_TYPE: &str = "block";
pub const TRANSACTION_DATA_TYPE: &str = "transaction";

/// Transaction types whose `fields` are summarized rather than passed through
pub const REWARD_TX_TYPES: [&str; 3] = ["rewards_v1", "rewards_v2", "rewards_v3"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Block {
    pub height: i64,
    pub time: i64,
    pub hash: String,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BlockTx {
    pub hash: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub data_type: String,
    pub hash: String,
    pub height: i64,
    pub time: i64,
    pub transaction_count: i64,
    pub block_transactions: Vec<BlockTx>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub data_type: String,
    pub height: i64,
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: i64,
    pub fields: String,
}

impl Transaction {
    pub fn is_reward(&self) -> bool {
        REWARD_TX_TYPES.contains(&self.kind.as_str())
    }
}
