use tracing::debug;

use super::{
    reward_series, rewards_since_yesterday, HotspotService, LedgerContext, RewardOwner,
    ValidatorService,
};
use crate::cache::{keys, TTL_HOUR, TTL_SEARCH, TTL_TEN_MINUTES};
use crate::db::{self, rows::AccountRow};
use crate::models::{
    Hotspot, Validator, Wallet, WalletBalance, WalletList, PAGE_SIZE, WALLET_DATA_TYPE,
};
use crate::rewards::RewardSeries;

const ACCOUNT_COLUMNS: &str = r#"
    address::TEXT AS address,
    COALESCE(block, 0)::BIGINT AS block,
    COALESCE(balance, 0)::BIGINT AS balance,
    COALESCE(dc_balance, 0)::BIGINT AS dc_balance,
    COALESCE(security_balance, 0)::BIGINT AS security_balance,
    COALESCE(staked_balance, 0)::BIGINT AS staked_balance,
    COALESCE(mobile_balance, 0)::BIGINT AS mobile_balance,
    COALESCE(iot_balance, 0)::BIGINT AS iot_balance
"#;

/// Reward series span for wallet pages
const WALLET_REWARD_DAYS: i64 = 30;

#[derive(Clone)]
pub struct WalletService {
    ctx: LedgerContext,
    hotspots: HotspotService,
    validators: ValidatorService,
}

impl WalletService {
    pub fn new(ctx: LedgerContext, hotspots: HotspotService, validators: ValidatorService) -> Self {
        Self {
            ctx,
            hotspots,
            validators,
        }
    }

    /// Accounts by most recent block, [`PAGE_SIZE`] per page.
    pub async fn list(&self, page: i64) -> Vec<WalletList> {
        let offset = page * PAGE_SIZE;
        let key = format!("{}{offset}", keys::WALLETS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_SEARCH, move || async move {
                let sql = format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY block DESC LIMIT $1 OFFSET $2"
                );
                let rows: Vec<AccountRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(PAGE_SIZE).bind(offset),
                    "wallet_list",
                )
                .await;

                let mut wallets = Vec::with_capacity(rows.len());
                for row in rows {
                    wallets.push(WalletList {
                        data_type: WALLET_DATA_TYPE.to_string(),
                        hotspot_count: self.hotspot_count(&row.address).await,
                        validator_count: self.validator_count(&row.address).await,
                        balance: row.balance(),
                        last_block: row.block,
                        address: row.address,
                    });
                }
                wallets
            })
            .await
    }

    pub async fn single(&self, hash: &str) -> Wallet {
        let balance = self.balance(hash).await;
        debug!(wallet = %hash, known = balance.is_known(), "wallet lookup");

        Wallet {
            data_type: WALLET_DATA_TYPE.to_string(),
            address: hash.to_string(),
            hotspot_count: self.hotspot_count(hash).await,
            balance,
            rewards: self.rewards(hash).await,
            rewards_24h: self.rewards_24h(hash).await,
            validator_count: self.validator_count(hash).await,
            last_block: self.last_block(hash).await,
        }
    }

    pub async fn hotspots(&self, hash: &str) -> Vec<Hotspot> {
        self.hotspots.owned_by(hash).await
    }

    pub async fn validators(&self, hash: &str) -> Vec<Validator> {
        self.validators.owned_by(hash).await
    }

    /// Balances of the latest account row; [`WalletBalance::UNKNOWN`] when
    /// the address has none.
    pub async fn balance(&self, hash: &str) -> WalletBalance {
        let key = format!("{}{hash}", keys::WALLET_BALANCE);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                let sql = format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE address = $1 ORDER BY block DESC LIMIT 1"
                );
                db::fetch_optional::<AccountRow>(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(hash),
                    "wallet_balance",
                )
                .await
                .map_or(WalletBalance::UNKNOWN, |row| row.balance())
            })
            .await
    }

    pub async fn hotspot_count(&self, hash: &str) -> i64 {
        let key = format!("{}{hash}", keys::WALLET_HOTSPOT_COUNT);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*)::BIGINT FROM gateway_inventory WHERE owner = $1",
                    )
                    .bind(hash),
                    "wallet_hotspot_count",
                )
                .await
            })
            .await
    }

    pub async fn validator_count(&self, hash: &str) -> i64 {
        let key = format!("{}{hash}", keys::WALLET_VALIDATOR_COUNT);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COUNT(*)::BIGINT FROM validator_inventory WHERE owner = $1",
                    )
                    .bind(hash),
                    "wallet_validator_count",
                )
                .await
            })
            .await
    }

    /// Highest block the account was updated at; 0 when unknown.
    pub async fn last_block(&self, hash: &str) -> i64 {
        let key = format!("{}{hash}", keys::WALLET_BLOCK);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_HOUR, move || async move {
                db::fetch_scalar(
                    &self.ctx.pool,
                    sqlx::query_scalar::<_, i64>(
                        "SELECT COALESCE(MAX(block), 0)::BIGINT FROM accounts WHERE address = $1",
                    )
                    .bind(hash),
                    "wallet_last_block",
                )
                .await
            })
            .await
    }

    pub async fn rewards(&self, hash: &str) -> RewardSeries {
        let key = format!("{}{hash}-{WALLET_REWARD_DAYS}", keys::WALLET_REWARDS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_HOUR, move || async move {
                reward_series(&self.ctx.pool, RewardOwner::Account, hash, WALLET_REWARD_DAYS).await
            })
            .await
    }

    pub async fn rewards_24h(&self, hash: &str) -> RewardSeries {
        let key = format!("{}{hash}", keys::WALLET_REWARDS_24H);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                rewards_since_yesterday(&self.ctx.pool, RewardOwner::Account, hash).await
            })
            .await
    }
}
