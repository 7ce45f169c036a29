//! Hotspot activity status
//!
//! A hotspot is active when its most recent ledger interaction happened less
//! than 36 hours ago. Active answers are cached longer than inactive ones so a
//! dormant hotspot coming back online is noticed within a minute.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::cache::{keys, TTL_TEN_MINUTES, TTL_VOLATILE};
use crate::db;
use crate::services::LedgerContext;

pub const ACTIVE_WINDOW_SECS: i64 = 36 * 3600;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatus {
    pub active: bool,
    pub timestamp: i64,
    pub tx: String,
}

/// Latest interaction of an actor, joined with its block time
#[derive(Debug, Clone, FromRow)]
pub struct LastInteraction {
    pub block: i64,
    pub tx: String,
    pub time: Option<i64>,
}

/// Classify the last interaction at `now` and pick the cache TTL for the answer.
pub fn classify(last: Option<&LastInteraction>, now: i64) -> (ActivityStatus, Duration) {
    let Some((time, tx)) = last
        .filter(|last| last.block > 0)
        .and_then(|last| last.time.filter(|t| *t != 0).map(|t| (t, last.tx.clone())))
    else {
        return (ActivityStatus::default(), TTL_VOLATILE);
    };

    let active = now - time < ACTIVE_WINDOW_SECS;
    let ttl = if active { TTL_TEN_MINUTES } else { TTL_VOLATILE };

    (
        ActivityStatus {
            active,
            timestamp: time,
            tx,
        },
        ttl,
    )
}

#[derive(Clone)]
pub struct StatusResolver {
    ctx: LedgerContext,
}

impl StatusResolver {
    pub fn new(ctx: LedgerContext) -> Self {
        Self { ctx }
    }

    pub async fn resolve(&self, address: &str) -> ActivityStatus {
        let key = format!("{}{address}", keys::HOTSPOT_STATUS);

        self.ctx
            .cache
            .get_or_compute_with_ttl(&key, move || async move {
                let last = db::fetch_optional::<LastInteraction>(
                    &self.ctx.pool,
                    sqlx::query(
                        r#"
                        SELECT ta.block::BIGINT AS block,
                               ta.transaction_hash::TEXT AS tx,
                               b.time::BIGINT AS time
                        FROM transaction_actors ta
                        LEFT JOIN blocks b ON b.height = ta.block
                        WHERE ta.actor = $1
                        ORDER BY ta.block DESC
                        LIMIT 1
                        "#,
                    )
                    .bind(address),
                    "last_interaction",
                )
                .await;

                classify(last.as_ref(), Utc::now().timestamp())
            })
            .await
    }
}
