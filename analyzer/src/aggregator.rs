//! Collection of repository data with per-repository failure isolation.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::api::{Client, Contributor, Error, PullRequest, RepoId, RepoMetadata, Result, StateFilter};
use crate::profile;

/// Everything collected for one repository. Replaced wholesale on re-collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: String,
    pub metadata: RepoMetadata,
    pub pull_requests: Vec<PullRequest>,
    pub contributors: Vec<Contributor>,
}

/// Aggregated state across repositories, keyed by `owner/name`. Failures are recorded against the
/// repository they hit instead of being swallowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub repos: BTreeMap<String, RepoRecord>,
    pub failures: BTreeMap<String, String>,
}

/// Per-item outcome of one [`Aggregator::collect`] run.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub collected: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Repositories never attempted because the quota ran out mid-run.
    pub uncollected: Vec<String>,
    /// Reset timestamp of the quota when the run stopped early.
    pub rate_limited_until: Option<i64>,
}

pub struct Aggregator<C> {
    client: C,
    state: AnalysisState,
}

impl<C: Client> Aggregator<C> {
    pub fn new(client: C) -> Self {
        Aggregator {
            client,
            state: AnalysisState::default(),
        }
    }

    /// Rebuilds an aggregator around previously collected state, e.g. a loaded snapshot.
    pub fn from_state(client: C, state: AnalysisState) -> Self {
        Aggregator { client, state }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn into_state(self) -> AnalysisState {
        self.state
    }

    /// Collects metadata, pull requests and contributors for each repository, scraping up to
    /// `max_profiles` contributor profiles per repository.
    ///
    /// A failure on one repository is recorded and does not stop the others. An exhausted quota
    /// does stop the run: the remaining repositories are reported as uncollected rather than
    /// burning requests that are guaranteed to fail.
    pub async fn collect(&mut self, repos: &[RepoId], max_profiles: usize) -> CollectionReport {
        let mut report = CollectionReport::default();

        for (position, repo) in repos.iter().enumerate() {
            info!("Collecting data for [{}]...", repo);
            match self.collect_repo(repo, max_profiles).await {
                Ok(record) => {
                    info!(
                        "Collected {} pull requests and {} contributors for [{}]",
                        record.pull_requests.len(),
                        record.contributors.len(),
                        repo
                    );
                    self.state.failures.remove(&repo.full_name());
                    self.state.repos.insert(repo.full_name(), record);
                    report.collected.push(repo.full_name());
                }
                Err(Error::RateLimit { reset }) => {
                    let error = Error::RateLimit { reset };
                    warn!("Stopping collection at [{}]: {}", repo, error);
                    self.state.failures.insert(repo.full_name(), error.to_string());
                    report.failed.push((repo.full_name(), error.to_string()));
                    report.rate_limited_until = Some(reset);
                    report.uncollected =
                        repos[position + 1..].iter().map(RepoId::full_name).collect();
                    break;
                }
                Err(error) => {
                    warn!("Could not collect [{}]: {}", repo, error);
                    self.state.failures.insert(repo.full_name(), error.to_string());
                    report.failed.push((repo.full_name(), error.to_string()));
                }
            }
        }

        report
    }

    async fn collect_repo(&self, repo: &RepoId, max_profiles: usize) -> Result<RepoRecord> {
        let metadata = self.client.repo_metadata(repo).await?;

        debug!("Fetching pull requests for [{}]...", repo);
        let mut pull_requests = self.client.pull_requests(repo, StateFilter::All).await?;
        for pull_request in &mut pull_requests {
            normalize_author(pull_request);
        }
        pull_requests.sort_by_key(|pull_request| pull_request.created_at);

        debug!("Fetching contributors for [{}]...", repo);
        let mut contributors = self.client.contributors(repo).await?;
        self.scrape_profiles(repo, &mut contributors, max_profiles).await?;

        Ok(RepoRecord {
            id: repo.full_name(),
            metadata,
            pull_requests,
            contributors,
        })
    }

    async fn scrape_profiles(
        &self,
        repo: &RepoId,
        contributors: &mut [Contributor],
        max_profiles: usize,
    ) -> Result<()> {
        for contributor in contributors.iter_mut().take(max_profiles) {
            let document = match self.client.user_profile_document(&contributor.username).await {
                Ok(document) => document,
                Err(Error::RateLimit { reset }) => return Err(Error::RateLimit { reset }),
                Err(error) => {
                    warn!(
                        "Skipping profile of [{}] for [{}]: {}",
                        contributor.username, repo, error
                    );
                    continue;
                }
            };
            match profile::parse_profile(&contributor.username, &document) {
                Ok(fields) => contributor.profile = Some(fields),
                Err(error) => warn!("{}", error),
            }
        }
        Ok(())
    }
}

/// Author logins arrive in mixed case; unique-author counting expects one spelling per account.
fn normalize_author(pull_request: &mut PullRequest) {
    if let Some(author) = pull_request.author.take() {
        let author = author.trim().to_lowercase();
        pull_request.author = if author.is_empty() { None } else { Some(author) };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::api::PrState;

    /// Canned per-repository responses; anything not listed answers with `NotFound`.
    #[derive(Default)]
    struct StubClient {
        repos: BTreeMap<String, (RepoMetadata, Vec<PullRequest>, Vec<Contributor>)>,
        profiles: BTreeMap<String, String>,
        rate_limited: bool,
    }

    #[async_trait]
    impl Client for StubClient {
        async fn repo_metadata(&self, repo: &RepoId) -> Result<RepoMetadata> {
            if self.rate_limited {
                return Err(Error::RateLimit { reset: 1_700_000_000 });
            }
            self.repos
                .get(&repo.full_name())
                .map(|(metadata, _, _)| metadata.clone())
                .ok_or_else(|| Error::NotFound {
                    resource: repo.full_name(),
                })
        }

        async fn pull_requests(&self, repo: &RepoId, _filter: StateFilter) -> Result<Vec<PullRequest>> {
            self.repos
                .get(&repo.full_name())
                .map(|(_, pull_requests, _)| pull_requests.clone())
                .ok_or_else(|| Error::NotFound {
                    resource: repo.full_name(),
                })
        }

        async fn contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>> {
            self.repos
                .get(&repo.full_name())
                .map(|(_, _, contributors)| contributors.clone())
                .ok_or_else(|| Error::NotFound {
                    resource: repo.full_name(),
                })
        }

        async fn user_profile_document(&self, username: &str) -> Result<String> {
            self.profiles
                .get(username)
                .cloned()
                .ok_or_else(|| Error::NotFound {
                    resource: username.to_string(),
                })
        }
    }

    fn metadata(full_name: &str) -> RepoMetadata {
        RepoMetadata {
            full_name: full_name.to_string(),
            description: None,
            stars: 42,
            forks: 7,
            default_branch: "main".to_string(),
        }
    }

    fn pull_request(number: u64, author: &str, day: u32) -> PullRequest {
        PullRequest {
            number,
            title: format!("change #{}", number),
            state: PrState::Open,
            author: Some(author.to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            closed_at: None,
            merged_at: None,
        }
    }

    fn contributor(username: &str) -> Contributor {
        Contributor {
            username: username.to_string(),
            contributions: 10,
            profile: None,
        }
    }

    #[tokio::test]
    async fn failure_on_one_repo_does_not_abort_the_rest() {
        let mut client = StubClient::default();
        client.repos.insert(
            "octo/demo".to_string(),
            (metadata("octo/demo"), vec![pull_request(1, "Alice", 3)], vec![]),
        );

        let mut aggregator = Aggregator::new(client);
        let ids = vec![RepoId::new("gone", "missing"), RepoId::new("octo", "demo")];
        let report = aggregator.collect(&ids, 0).await;

        assert_eq!(report.collected, vec!["octo/demo"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "gone/missing");
        assert!(report.uncollected.is_empty());

        let state = aggregator.state();
        assert!(state.repos.contains_key("octo/demo"));
        assert!(!state.repos.contains_key("gone/missing"));
        assert!(state.failures.contains_key("gone/missing"));
    }

    #[tokio::test]
    async fn rate_limit_stops_the_run_and_reports_the_rest() {
        let client = StubClient {
            rate_limited: true,
            ..StubClient::default()
        };

        let mut aggregator = Aggregator::new(client);
        let ids = vec![
            RepoId::new("octo", "demo"),
            RepoId::new("octo", "second"),
            RepoId::new("octo", "third"),
        ];
        let report = aggregator.collect(&ids, 0).await;

        assert!(report.collected.is_empty());
        assert_eq!(report.rate_limited_until, Some(1_700_000_000));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.uncollected, vec!["octo/second", "octo/third"]);
    }

    #[tokio::test]
    async fn authors_are_normalized_and_prs_sorted_by_creation() {
        let mut client = StubClient::default();
        client.repos.insert(
            "octo/demo".to_string(),
            (
                metadata("octo/demo"),
                vec![
                    pull_request(2, " Alice ", 9),
                    pull_request(1, "ALICE", 3),
                ],
                vec![],
            ),
        );

        let mut aggregator = Aggregator::new(client);
        aggregator.collect(&[RepoId::new("octo", "demo")], 0).await;

        let record = &aggregator.state().repos["octo/demo"];
        assert_eq!(record.pull_requests[0].number, 1);
        assert_eq!(record.pull_requests[1].number, 2);
        assert!(record
            .pull_requests
            .iter()
            .all(|pull_request| pull_request.author.as_deref() == Some("alice")));
    }

    #[tokio::test]
    async fn profile_scrape_is_capped_and_failures_leave_profile_absent() {
        let mut client = StubClient::default();
        client.repos.insert(
            "octo/demo".to_string(),
            (
                metadata("octo/demo"),
                vec![],
                vec![contributor("alice"), contributor("ghost"), contributor("carol")],
            ),
        );
        client.profiles.insert(
            "alice".to_string(),
            r#"<span class="p-name">Alice A</span>"#.to_string(),
        );
        // "ghost" has no profile page; "carol" is beyond the cap

        let mut aggregator = Aggregator::new(client);
        aggregator.collect(&[RepoId::new("octo", "demo")], 2).await;

        let contributors = &aggregator.state().repos["octo/demo"].contributors;
        assert_eq!(
            contributors[0].profile.as_ref().unwrap().display_name.as_deref(),
            Some("Alice A")
        );
        assert_eq!(contributors[1].profile, None);
        assert_eq!(contributors[2].profile, None);
    }
}
