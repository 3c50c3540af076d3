//! Per-repository scalar summaries, recomputed on demand from the aggregated state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregator::{AnalysisState, RepoRecord};
use crate::api::PrState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoSummary {
    pub repo: String,
    pub open_prs: u64,
    pub closed_prs: u64,
    pub unique_authors: u64,
    /// Minimum creation timestamp; absent for a repository with no pull requests.
    pub oldest_pr: Option<DateTime<Utc>>,
}

/// Summarizes every collected repository. A repository with zero pull requests yields zero counts
/// and an absent oldest-PR date rather than an error.
pub fn compute_summaries(state: &AnalysisState) -> BTreeMap<String, RepoSummary> {
    state
        .repos
        .values()
        .map(|record| (record.id.clone(), summarize(record)))
        .collect()
}

fn summarize(record: &RepoRecord) -> RepoSummary {
    let open_prs = count_state(record, PrState::Open);
    let closed_prs = count_state(record, PrState::Closed);
    let authors: BTreeSet<&str> = record
        .pull_requests
        .iter()
        .filter_map(|pull_request| pull_request.author.as_deref())
        .collect();
    let oldest_pr = record
        .pull_requests
        .iter()
        .map(|pull_request| pull_request.created_at)
        .min();

    RepoSummary {
        repo: record.id.clone(),
        open_prs,
        closed_prs,
        unique_authors: authors.len() as u64,
        oldest_pr,
    }
}

fn count_state(record: &RepoRecord, state: PrState) -> u64 {
    record
        .pull_requests
        .iter()
        .filter(|pull_request| pull_request.state == state)
        .count() as u64
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::api::{PullRequest, RepoMetadata};

    fn record(id: &str, pull_requests: Vec<PullRequest>) -> RepoRecord {
        RepoRecord {
            id: id.to_string(),
            metadata: RepoMetadata {
                full_name: id.to_string(),
                description: None,
                stars: 0,
                forks: 0,
                default_branch: "main".to_string(),
            },
            pull_requests,
            contributors: vec![],
        }
    }

    fn pull_request(number: u64, state: PrState, author: Option<&str>, day: u32) -> PullRequest {
        PullRequest {
            number,
            title: String::new(),
            state,
            author: author.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
            closed_at: None,
            merged_at: None,
        }
    }

    fn state_of(records: Vec<RepoRecord>) -> AnalysisState {
        let mut state = AnalysisState::default();
        for record in records {
            state.repos.insert(record.id.clone(), record);
        }
        state
    }

    #[test]
    fn counts_states_and_distinct_authors() {
        let state = state_of(vec![record(
            "octo/demo",
            vec![
                pull_request(1, PrState::Open, Some("alice"), 1),
                pull_request(2, PrState::Open, Some("bob"), 2),
                pull_request(3, PrState::Closed, Some("alice"), 3),
            ],
        )]);

        let summaries = compute_summaries(&state);
        let summary = &summaries["octo/demo"];
        assert_eq!(summary.open_prs, 2);
        assert_eq!(summary.closed_prs, 1);
        assert_eq!(summary.unique_authors, 2);
        assert_eq!(
            summary.oldest_pr,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn open_plus_closed_equals_total() {
        let pull_requests = vec![
            pull_request(1, PrState::Open, Some("a"), 1),
            pull_request(2, PrState::Closed, Some("b"), 2),
            pull_request(3, PrState::Closed, Some("c"), 3),
            pull_request(4, PrState::Closed, None, 4),
        ];
        let total = pull_requests.len() as u64;
        let state = state_of(vec![record("octo/demo", pull_requests)]);

        let summaries = compute_summaries(&state);
        let summary = &summaries["octo/demo"];
        assert_eq!(summary.open_prs + summary.closed_prs, total);
        assert!(summary.unique_authors <= total);
    }

    #[test]
    fn empty_repository_summarizes_to_zeros() {
        let state = state_of(vec![record("octo/empty", vec![])]);
        let summaries = compute_summaries(&state);
        let summary = &summaries["octo/empty"];
        assert_eq!(summary.open_prs, 0);
        assert_eq!(summary.closed_prs, 0);
        assert_eq!(summary.unique_authors, 0);
        assert_eq!(summary.oldest_pr, None);
    }

    #[test]
    fn deleted_authors_do_not_count_as_distinct() {
        let state = state_of(vec![record(
            "octo/demo",
            vec![
                pull_request(1, PrState::Open, None, 1),
                pull_request(2, PrState::Open, None, 2),
            ],
        )]);
        assert_eq!(compute_summaries(&state)["octo/demo"].unique_authors, 0);
    }
}
