use std::collections::BTreeMap;

use tracing::warn;

use super::LedgerContext;
use crate::activity::{RewardEntry, RewardsFields};
use crate::cache::{keys, TTL_VOLATILE};
use crate::db::{self, rows::TransactionRow};
use crate::models::{
    Block, BlockData, BlockTx, Transaction, BLOCK_DATA_TYPE, PAGE_SIZE, TRANSACTION_DATA_TYPE,
};

const BLOCK_COLUMNS: &str = r#"
    height::BIGINT AS height,
    COALESCE(time, 0)::BIGINT AS time,
    COALESCE(block_hash, '')::TEXT AS hash,
    COALESCE(transaction_count, 0)::BIGINT AS transaction_count
"#;

const TRANSACTION_COLUMNS: &str = r#"
    COALESCE(block, 0)::BIGINT AS block,
    hash::TEXT AS hash,
    COALESCE(type, '')::TEXT AS type,
    COALESCE(time, 0)::BIGINT AS time,
    COALESCE(fields::TEXT, '') AS fields
"#;

/// Per-type count and `<type>_amount` sum of a reward transaction, plus its
/// epoch range, as a JSON object string.
pub fn summarize_rewards(fields: &RewardsFields) -> String {
    let mut summary: BTreeMap<String, i64> = BTreeMap::new();
    for reward in &fields.rewards {
        *summary.entry(reward.kind.clone()).or_insert(0) += 1;
        *summary.entry(format!("{}_amount", reward.kind)).or_insert(0) += reward.amount;
    }
    summary.insert("start_epoch".to_string(), fields.start_epoch);
    summary.insert("end_epoch".to_string(), fields.end_epoch);

    serde_json::to_string(&summary).unwrap_or_default()
}

fn into_transaction(row: TransactionRow) -> Transaction {
    let mut tx = Transaction {
        data_type: TRANSACTION_DATA_TYPE.to_string(),
        height: row.block,
        hash: row.hash,
        kind: row.kind,
        time: row.time,
        fields: row.fields,
    };

    if tx.is_reward() {
        match RewardsFields::parse(&tx.fields) {
            Ok(fields) => tx.fields = summarize_rewards(&fields),
            Err(e) => warn!(tx = %tx.hash, error = %e, "undecodable reward transaction"),
        }
    }
    tx
}

/// Blocks and transactions
#[derive(Clone)]
pub struct ChainService {
    ctx: LedgerContext,
}

impl ChainService {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    pub async fn blocks(&self, page: i64) -> Vec<Block> {
        let offset = page * PAGE_SIZE;
        let key = format!("{}{offset}", keys::BLOCKS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let sql = format!(
                    "SELECT {BLOCK_COLUMNS} FROM blocks ORDER BY height DESC LIMIT $1 OFFSET $2"
                );
                db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(PAGE_SIZE).bind(offset),
                    "block_list",
                )
                .await
            })
            .await
    }

    /// Block with its transactions; empty when the height is unknown.
    pub async fn block(&self, height: i64) -> Vec<BlockData> {
        let key = format!("{}{height}", keys::BLOCK);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE height = $1");
                let Some(block) = db::fetch_optional::<Block>(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(height),
                    "block",
                )
                .await
                else {
                    return Vec::new();
                };

                let transactions: Vec<BlockTx> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT hash::TEXT AS hash,
                               COALESCE(type, '')::TEXT AS type,
                               COALESCE(fields::TEXT, '') AS fields
                        FROM transactions
                        WHERE block = $1
                        "#,
                    )
                    .bind(height),
                    "block_transactions",
                )
                .await;

                vec![BlockData {
                    data_type: BLOCK_DATA_TYPE.to_string(),
                    hash: block.hash,
                    height: block.height,
                    time: block.time,
                    transaction_count: transactions.len() as i64,
                    block_transactions: transactions,
                }]
            })
            .await
    }

    pub async fn transactions(&self, page: i64) -> Vec<Transaction> {
        let offset = page * PAGE_SIZE;
        let key = format!("{}{offset}", keys::TRANSACTIONS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let sql = format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY block DESC LIMIT $1 OFFSET $2"
                );
                let rows: Vec<TransactionRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(PAGE_SIZE).bind(offset),
                    "transaction_list",
                )
                .await;

                rows.into_iter().map(into_transaction).collect()
            })
            .await
    }

    /// Transaction wrapped in a list; empty when the hash is unknown.
    pub async fn transaction(&self, hash: &str) -> Vec<Transaction> {
        let key = format!("{}{hash}", keys::TRANSACTION);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                self.transaction_row(hash)
                    .await
                    .map(into_transaction)
                    .into_iter()
                    .collect()
            })
            .await
    }

    /// A page of a reward transaction's reward list; empty for other types.
    pub async fn transaction_rewards(
        &self,
        hash: &str,
        page: usize,
        limit: usize,
    ) -> Vec<RewardEntry> {
        let key = format!("{}{hash}-{page}-{limit}", keys::TRANSACTION_REWARDS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let Some(row) = self.transaction_row(hash).await else {
                    return Vec::new();
                };
                if !crate::models::REWARD_TX_TYPES.contains(&row.kind.as_str()) {
                    return Vec::new();
                }

                match RewardsFields::parse(&row.fields) {
                    Ok(fields) => fields
                        .rewards
                        .into_iter()
                        .skip(page.saturating_mul(limit))
                        .take(limit)
                        .collect(),
                    Err(e) => {
                        warn!(tx = %hash, error = %e, "undecodable reward transaction");
                        Vec::new()
                    }
                }
            })
            .await
    }

    async fn transaction_row(&self, hash: &str) -> Option<TransactionRow> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE hash = $1");
        db::fetch_optional(&self.ctx.pool, sqlx::query(&sql).bind(hash), "transaction").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_summary_counts_and_sums_per_type() {
        let fields = RewardsFields::parse(
            r#"{
                "start_epoch": 10,
                "end_epoch": 40,
                "rewards": [
                    {"type": "poc_witnesses", "amount": 5, "account": "a", "gateway": "g1"},
                    {"type": "poc_witnesses", "amount": 7, "account": "a", "gateway": "g2"},
                    {"type": "securities", "amount": 100, "account": "b", "gateway": null}
                ]
            }"#,
        )
        .unwrap();

        let summary: BTreeMap<String, i64> =
            serde_json::from_str(&summarize_rewards(&fields)).unwrap();

        assert_eq!(summary["poc_witnesses"], 2);
        assert_eq!(summary["poc_witnesses_amount"], 12);
        assert_eq!(summary["securities"], 1);
        assert_eq!(summary["securities_amount"], 100);
        assert_eq!(summary["start_epoch"], 10);
        assert_eq!(summary["end_epoch"], 40);
    }

    #[test]
    fn only_reward_transactions_are_summarized() {
        let row = |kind: &str| TransactionRow {
            block: 1,
            hash: "h".into(),
            kind: kind.into(),
            time: 2,
            fields: r#"{"rewards":[],"start_epoch":1,"end_epoch":2}"#.into(),
        };

        let payment = into_transaction(row("payment_v2"));
        assert_eq!(payment.fields, r#"{"rewards":[],"start_epoch":1,"end_epoch":2}"#);

        let rewards = into_transaction(row("rewards_v2"));
        assert_eq!(rewards.fields, r#"{"end_epoch":2,"start_epoch":1}"#);
        assert_eq!(rewards.data_type, "transaction");
        assert_eq!(rewards.height, 1);
    }
}
