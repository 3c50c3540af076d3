//! Bucketed pull-request creation counts per repository.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::aggregator::{AnalysisState, RepoRecord};

/// Width of a time bucket. Weekly buckets start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Bucketing {
    Daily,
    Weekly,
}

impl Bucketing {
    fn bucket_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Bucketing::Daily => date,
            Bucketing::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
        }
    }

    fn step(self) -> Duration {
        match self {
            Bucketing::Daily => Duration::days(1),
            Bucketing::Weekly => Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    pub period: NaiveDate,
    pub count: u64,
}

/// Builds one ordered series per repository.
///
/// Buckets between the first and last observed period are materialized with a zero count, so a
/// gap in the series reads as zero activity rather than missing data. A repository with no pull
/// requests yields an empty series.
pub fn build_time_series(
    state: &AnalysisState,
    bucketing: Bucketing,
) -> BTreeMap<String, Vec<TimePoint>> {
    state
        .repos
        .values()
        .map(|record| (record.id.clone(), series_for(record, bucketing)))
        .collect()
}

fn series_for(record: &RepoRecord, bucketing: Bucketing) -> Vec<TimePoint> {
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for pull_request in &record.pull_requests {
        let bucket = bucketing.bucket_of(pull_request.created_at.date_naive());
        *counts.entry(bucket).or_insert(0) += 1;
    }

    let (first, last) = match (
        counts.keys().next().copied(),
        counts.keys().next_back().copied(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut series = Vec::new();
    let mut period = first;
    while period <= last {
        series.push(TimePoint {
            period,
            count: counts.get(&period).copied().unwrap_or(0),
        });
        period = period + bucketing.step();
    }
    series
}
