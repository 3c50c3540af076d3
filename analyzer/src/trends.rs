//! Direction labels and cross-repository activity ranking over bucketed series.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use strum_macros::Display;

use crate::timeseries::TimePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Increasing,
    Decreasing,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoTrend {
    pub direction: Direction,
    pub total: u64,
    pub peak: u64,
    pub first_half: u64,
    pub second_half: u64,
    /// Early-to-late change; absent when the first half saw no activity.
    pub change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub trends: BTreeMap<String, RepoTrend>,
    /// Repository ids ordered by total activity, most active first; ties break by id.
    pub ranking: Vec<String>,
}

/// Labels each series and ranks repositories by total activity. Deterministic: the label depends
/// only on the series' own shape, the ranking only on totals and ids.
pub fn describe_trends(series: &BTreeMap<String, Vec<TimePoint>>) -> TrendReport {
    let trends: BTreeMap<String, RepoTrend> = series
        .iter()
        .map(|(repo, points)| (repo.clone(), trend_of(points)))
        .collect();

    let mut ranking: Vec<String> = trends.keys().cloned().collect();
    ranking.sort_by(|left, right| {
        trends[right]
            .total
            .cmp(&trends[left].total)
            .then_with(|| left.cmp(right))
    });

    TrendReport { trends, ranking }
}

/// Splits the series in two halves (the first half gets `len / 2` buckets) and compares their
/// sums; an exact tie or a series shorter than two buckets is flat.
fn trend_of(points: &[TimePoint]) -> RepoTrend {
    let mid = points.len() / 2;
    let first_half: u64 = points[..mid].iter().map(|point| point.count).sum();
    let second_half: u64 = points[mid..].iter().map(|point| point.count).sum();

    let direction = if points.len() < 2 {
        Direction::Flat
    } else {
        match second_half.cmp(&first_half) {
            Ordering::Greater => Direction::Increasing,
            Ordering::Less => Direction::Decreasing,
            Ordering::Equal => Direction::Flat,
        }
    };

    let change_pct = if first_half > 0 {
        Some((second_half as f64 - first_half as f64) / first_half as f64 * 100.0)
    } else {
        None
    };

    RepoTrend {
        direction,
        total: first_half + second_half,
        peak: points.iter().map(|point| point.count).max().unwrap_or(0),
        first_half,
        second_half,
        change_pct,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn series(counts: &[u64]) -> Vec<TimePoint> {
        counts
            .iter()
            .enumerate()
            .map(|(index, count)| TimePoint {
                period: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(index as i64),
                count: *count,
            })
            .collect()
    }

    fn report_for(entries: &[(&str, &[u64])]) -> TrendReport {
        let map: BTreeMap<String, Vec<TimePoint>> = entries
            .iter()
            .map(|(repo, counts)| (repo.to_string(), series(counts)))
            .collect();
        describe_trends(&map)
    }

    #[test]
    fn growing_series_is_increasing() {
        let report = report_for(&[("octo/demo", &[1, 1, 4, 5])]);
        let trend = &report.trends["octo/demo"];
        assert_eq!(trend.direction, Direction::Increasing);
        assert_eq!(trend.total, 11);
        assert_eq!(trend.peak, 5);
        assert_eq!(trend.change_pct, Some(350.0));
    }

    #[test]
    fn shrinking_series_is_decreasing() {
        let report = report_for(&[("octo/demo", &[5, 4, 1, 1])]);
        assert_eq!(report.trends["octo/demo"].direction, Direction::Decreasing);
    }

    #[test]
    fn tie_is_flat() {
        let report = report_for(&[("octo/demo", &[2, 3, 3, 2])]);
        assert_eq!(report.trends["octo/demo"].direction, Direction::Flat);
    }

    #[test]
    fn short_and_empty_series_are_flat() {
        let report = report_for(&[("one", &[9]), ("none", &[])]);
        assert_eq!(report.trends["one"].direction, Direction::Flat);
        assert_eq!(report.trends["none"].direction, Direction::Flat);
        assert_eq!(report.trends["none"].total, 0);
    }

    #[test]
    fn direction_is_independent_of_repo_labels() {
        let first = report_for(&[("a", &[1, 5]), ("b", &[5, 1])]);
        let second = report_for(&[("b", &[1, 5]), ("a", &[5, 1])]);
        assert_eq!(first.trends["a"].direction, second.trends["b"].direction);
        assert_eq!(first.trends["b"].direction, second.trends["a"].direction);
    }

    #[test]
    fn ranking_orders_by_total_then_id() {
        let report = report_for(&[("b", &[3, 3]), ("a", &[1, 1]), ("c", &[3, 3])]);
        assert_eq!(report.ranking, vec!["b", "c", "a"]);
    }
}
