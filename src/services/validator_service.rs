use chrono::{NaiveDate, Utc};
use tracing::warn;

use super::{name_patterns, reward_series, rewards_since_yesterday, LedgerContext, RewardOwner};
use crate::cache::{keys, TTL_SEARCH, TTL_TEN_MINUTES, TTL_VOLATILE};
use crate::db::{
    self,
    rows::{ValidatorRow, VALIDATOR_COLUMNS},
};
use crate::models::{Penalty, SingleValidator, Validator, PAGE_SIZE, VALIDATOR_DATA_TYPE};

const VALIDATOR_FROM: &str = r#"
    FROM validator_inventory i
    INNER JOIN validator_status s ON i.address = s.address
"#;

const VALIDATOR_REWARD_DAYS: i64 = 30;

/// Required stake per validator, in whole tokens
const VALIDATOR_STAKE: f64 = 10_000.0;
const PRE_HALVING_TOKENS_PER_DAY: i64 = 10_000;
const POST_HALVING_TOKENS_PER_DAY: i64 = PRE_HALVING_TOKENS_PER_DAY / 2;
const DAYS_PER_YEAR: i64 = 365;

fn halving_horizon() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 8, 1).unwrap_or_default()
}

/// Yearly return per online validator, split between operator and stakers.
///
/// Zero when no validator is online.
pub fn validator_apr(online: i64, today: NaiveDate) -> f64 {
    if online <= 0 {
        return 0.0;
    }

    let days_until_halving = (today - halving_horizon()).num_days().clamp(0, DAYS_PER_YEAR);
    let days_after_halving = DAYS_PER_YEAR - days_until_halving;
    let blended = PRE_HALVING_TOKENS_PER_DAY * days_until_halving
        + POST_HALVING_TOKENS_PER_DAY * days_after_halving;

    (blended as f64 / online as f64 / VALIDATOR_STAKE) / 2.0
}

/// Stored penalty list; malformed JSON reads as no penalties.
fn parse_penalties(address: &str, raw: &str) -> Vec<Penalty> {
    match serde_json::from_str::<Option<Vec<Penalty>>>(raw) {
        Ok(penalties) => penalties.unwrap_or_default(),
        Err(e) => {
            warn!(validator = %address, error = %e, "undecodable penalties");
            Vec::new()
        }
    }
}

/// Clamp a page window to `len` entries.
fn page_window(len: usize, page: i64) -> std::ops::Range<usize> {
    let size = PAGE_SIZE as usize;
    let start = usize::try_from(page).unwrap_or(0).saturating_mul(size).min(len);
    start..start.saturating_add(size).min(len)
}

#[derive(Clone)]
pub struct ValidatorService {
    ctx: LedgerContext,
}

impl ValidatorService {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    /// Every validator joined with its status; callers cache what they derive.
    pub async fn all(&self) -> Vec<Validator> {
        let sql = format!("SELECT {VALIDATOR_COLUMNS} {VALIDATOR_FROM}");
        let rows: Vec<ValidatorRow> =
            db::fetch_lenient(&self.ctx.pool, sqlx::query(&sql), "validator_list").await;

        rows.into_iter().map(Validator::from).collect()
    }

    pub async fn list(&self, page: i64) -> Vec<Validator> {
        let offset = page * PAGE_SIZE;
        let key = format!("{}{offset}", keys::VALIDATORS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_VOLATILE, move || async move {
                let mut validators = self.all().await;
                let window = page_window(validators.len(), page);
                validators.drain(window).collect()
            })
            .await
    }

    /// Validator with rewards and penalties; zero values when unknown.
    pub async fn single(&self, hash: &str) -> SingleValidator {
        let key = format!("{}{hash}", keys::VALIDATOR);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                let sql = format!("SELECT {VALIDATOR_COLUMNS} {VALIDATOR_FROM} WHERE i.address = $1");
                let Some(row) = db::fetch_optional::<ValidatorRow>(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(hash),
                    "single_validator",
                )
                .await
                else {
                    return SingleValidator::default();
                };

                let rewards = crate::rewards::bucket_by_day(
                    reward_series(&self.ctx.pool, RewardOwner::Gateway, hash, VALIDATOR_REWARD_DAYS)
                        .await,
                );
                let rewards_24h =
                    rewards_since_yesterday(&self.ctx.pool, RewardOwner::Gateway, hash).await;
                let penalties = parse_penalties(&row.address, &row.penalties);

                SingleValidator {
                    data_type: VALIDATOR_DATA_TYPE.to_string(),
                    address: row.address,
                    owner: row.owner,
                    name: row.name,
                    online: row.online,
                    version_heartbeat: row.version_heartbeat,
                    last_heartbeat: row.last_heartbeat,
                    staked: row.staked,
                    rewards,
                    rewards_24h,
                    penalty_score: row.penalty,
                    penalties,
                }
            })
            .await
    }

    pub async fn owned_by(&self, owner: &str) -> Vec<Validator> {
        let key = format!("{}{owner}", keys::WALLET_VALIDATORS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_TEN_MINUTES, move || async move {
                let sql = format!("SELECT {VALIDATOR_COLUMNS} {VALIDATOR_FROM} WHERE i.owner = $1");
                let rows: Vec<ValidatorRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(owner),
                    "wallet_validators",
                )
                .await;

                rows.into_iter().map(Validator::from).collect()
            })
            .await
    }

    pub async fn search_by_name(&self, query: &str) -> Vec<Validator> {
        let key = format!("{}{query}", keys::SEARCH_VALIDATORS);

        self.ctx
            .cache
            .get_or_compute(&key, TTL_SEARCH, move || async move {
                let patterns = name_patterns(query);
                if patterns.is_empty() {
                    return Vec::new();
                }

                let sql = format!(
                    "SELECT {VALIDATOR_COLUMNS} {VALIDATOR_FROM}
                     WHERE i.name LIKE ALL($1) AND i.address IS NOT NULL AND i.name IS NOT NULL"
                );
                let rows: Vec<ValidatorRow> = db::fetch_lenient(
                    &self.ctx.pool,
                    sqlx::query(&sql).bind(patterns),
                    "validator_name_search",
                )
                .await;

                rows.into_iter().map(Validator::from).collect()
            })
            .await
    }

    /// APR for today's date.
    pub fn apr(&self, online: i64) -> f64 {
        validator_apr(online, Utc::now().date_naive())
    }
}

impl From<SingleValidator> for Validator {
    fn from(single: SingleValidator) -> Self {
        Self {
            data_type: single.data_type,
            address: single.address,
            owner: single.owner,
            name: single.name,
            online: single.online,
            version_heartbeat: single.version_heartbeat,
            last_heartbeat: single.last_heartbeat,
            staked: single.staked,
            penalty_score: single.penalty_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn apr_is_zero_without_online_validators() {
        assert_eq!(validator_apr(0, date(2022, 1, 1)), 0.0);
    }

    #[test]
    fn apr_blends_pre_and_post_halving_days() {
        // Before the horizon every day counts at the post-halving rate.
        let before = validator_apr(100, date(2021, 1, 1));
        assert!((before - 5_000.0 * 365.0 / 100.0 / 10_000.0 / 2.0).abs() < 1e-9);

        // A full year past the horizon every day counts at the pre-halving rate.
        let after = validator_apr(100, date(2023, 1, 1));
        assert!((after - 10_000.0 * 365.0 / 100.0 / 10_000.0 / 2.0).abs() < 1e-9);

        let partial = validator_apr(100, date(2021, 8, 11));
        let blended = 10_000.0 * 10.0 + 5_000.0 * 355.0;
        assert!((partial - blended / 100.0 / 10_000.0 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn penalties_tolerate_null_and_garbage() {
        assert!(parse_penalties("v", "null").is_empty());
        assert!(parse_penalties("v", "{oops").is_empty());

        let penalties = parse_penalties(
            "v",
            r#"[{"type":"tenure","amount":1.5,"height":900}]"#,
        );
        assert_eq!(
            penalties,
            vec![Penalty {
                kind: "tenure".into(),
                amount: 1.5,
                height: 900
            }]
        );
    }

    #[test]
    fn page_window_is_clamped() {
        assert_eq!(page_window(30, 0), 0..25);
        assert_eq!(page_window(30, 1), 25..30);
        assert_eq!(page_window(30, 5), 30..30);
        assert_eq!(page_window(0, 0), 0..0);
    }
}
