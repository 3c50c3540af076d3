//! Client abstraction over the repository-hosting API, the record types it yields and the error
//! taxonomy shared across the workspace.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or rejected credentials. Fatal; nothing should be collected after this.
    #[error("missing or invalid GitHub credentials: {0}")]
    Auth(String),
    /// The API quota is exhausted. `reset` is the unix timestamp at which the quota refills,
    /// so an outer loop can wait and re-run. Never retried automatically.
    #[error("GitHub API rate limit exhausted; quota resets at unix timestamp {reset}")]
    RateLimit { reset: i64 },
    #[error("[{resource}] not found")]
    NotFound { resource: String },
    /// The fetched profile document had no recognizable structure. Missing individual fields are
    /// not an error; see [`crate::profile::parse_profile`].
    #[error("could not parse profile document for [{username}]: {reason}")]
    ProfileParse { username: String, reason: String },
    // :# prints the nested causes as well, using anyhow's formatting
    #[error("{operation} failed for [{subject}]; nested = {source:#}")]
    Transport {
        operation: &'static str,
        subject: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoId::new(owner, name))
            }
            _ => Err(Error::Other(anyhow::anyhow!(
                "repository must be written as owner/name, got [{}]",
                value
            ))),
        }
    }
}

/// Lifecycle state of a pull request as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

/// State filter passed to the pull-request listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StateFilter {
    Open,
    Closed,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub default_branch: String,
}

/// A single pull request. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: PrState,
    /// Login of the author; absent when the account has been deleted.
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub username: String,
    pub contributions: u64,
    /// Scraped profile fields; stays `None` when scraping was skipped or failed.
    pub profile: Option<ProfileFields>,
}

/// Fields scraped from a public profile page. Extraction is best-effort, so every field is
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub followers: Option<String>,
    pub following: Option<String>,
}

/// Data-fetching surface the aggregator runs against.
///
/// List endpoints follow pagination until exhaustion and return items in the order the API
/// supplied them.
#[async_trait]
pub trait Client: Send + Sync {
    async fn repo_metadata(&self, repo: &RepoId) -> Result<RepoMetadata>;

    async fn pull_requests(&self, repo: &RepoId, filter: StateFilter) -> Result<Vec<PullRequest>>;

    async fn contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>>;

    /// Raw HTML of the user's public profile page. Single fetch, no pagination.
    async fn user_profile_document(&self, username: &str) -> Result<String>;
}
