//! Daily reward series
//!
//! Sparse `(unix_time, amount)` samples become a dense UTC-day series that runs
//! from the first observed day through today, with empty days zero-filled.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// UTC-midnight timestamp to summed amount, ordered by day
pub type RewardSeries = BTreeMap<i64, i64>;

/// One raw reward observation as read from the `rewards` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RewardSample {
    pub time: i64,
    pub amount: i64,
}

/// Floor a unix timestamp to its UTC midnight.
pub fn utc_midnight(ts: i64) -> i64 {
    ts.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

pub fn today_utc_midnight() -> i64 {
    utc_midnight(Utc::now().timestamp())
}

/// Bucket samples by UTC day up to and including today.
pub fn bucket_by_day<I>(samples: I) -> RewardSeries
where
    I: IntoIterator<Item = (i64, i64)>,
{
    bucket_by_day_until(samples, today_utc_midnight())
}

/// Bucket samples by UTC day, filling every day from the earliest sample
/// through `today` with zero.
///
/// Days after `today` keep their sums but never extend the dense range.
pub fn bucket_by_day_until<I>(samples: I, today: i64) -> RewardSeries
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let mut sums = RewardSeries::new();
    for (ts, amount) in samples {
        *sums.entry(utc_midnight(ts)).or_insert(0) += amount;
    }

    let Some(&first_day) = sums.keys().next() else {
        return sums;
    };

    let today = utc_midnight(today);
    let mut series: RewardSeries = (0..)
        .map(|n| first_day + n * SECONDS_PER_DAY)
        .take_while(|day| *day <= today)
        .map(|day| (day, 0))
        .collect();

    series.extend(sums);
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY1: i64 = 1_600_041_600; // 2020-09-14T00:00:00Z

    #[test]
    fn empty_input_is_empty_series() {
        assert!(bucket_by_day(Vec::new()).is_empty());
    }

    #[test]
    fn same_day_amounts_are_summed_and_gaps_filled() {
        let samples = vec![(DAY1, 100), (DAY1 + 3 * 3600, 50), (DAY1 + 2 * SECONDS_PER_DAY, 20)];

        let series = bucket_by_day_until(samples, DAY1 + 2 * SECONDS_PER_DAY);

        assert_eq!(
            series,
            BTreeMap::from([
                (DAY1, 150),
                (DAY1 + SECONDS_PER_DAY, 0),
                (DAY1 + 2 * SECONDS_PER_DAY, 20),
            ])
        );
    }

    #[test]
    fn series_runs_through_today() {
        let today = DAY1 + 5 * SECONDS_PER_DAY + 7_200;
        let series = bucket_by_day_until([(DAY1 + 60, 10)], today);

        assert_eq!(series.len(), 6);
        assert_eq!(series.keys().last(), Some(&(DAY1 + 5 * SECONDS_PER_DAY)));
        assert_eq!(series.values().sum::<i64>(), 10);
    }

    #[test]
    fn keys_are_contiguous_midnights() {
        let series = bucket_by_day_until(
            [(DAY1 + 1, 1), (DAY1 + 9 * SECONDS_PER_DAY + 5, 2)],
            DAY1 + 10 * SECONDS_PER_DAY,
        );

        let keys: Vec<i64> = series.keys().copied().collect();
        assert!(keys.iter().all(|k| k % SECONDS_PER_DAY == 0));
        assert!(keys.windows(2).all(|w| w[1] - w[0] == SECONDS_PER_DAY));
    }

    #[test]
    fn rebucketing_is_idempotent() {
        let today = DAY1 + 4 * SECONDS_PER_DAY;
        let once = bucket_by_day_until([(DAY1 + 10, 7), (DAY1 + 3 * SECONDS_PER_DAY, 3)], today);
        let twice = bucket_by_day_until(once.clone(), today);

        assert_eq!(once, twice);
    }

    #[test]
    fn future_samples_do_not_extend_the_range() {
        let today = DAY1 + SECONDS_PER_DAY;
        let series = bucket_by_day_until([(DAY1, 1), (DAY1 + 5 * SECONDS_PER_DAY, 9)], today);

        assert_eq!(
            series,
            BTreeMap::from([(DAY1, 1), (DAY1 + SECONDS_PER_DAY, 0), (DAY1 + 5 * SECONDS_PER_DAY, 9)])
        );
    }

    #[test]
    fn pre_epoch_timestamps_floor_downwards() {
        assert_eq!(utc_midnight(-1), -SECONDS_PER_DAY);
    }
}
