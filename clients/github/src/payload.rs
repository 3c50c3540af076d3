use chrono::{DateTime, Utc};
use repo_analyzer::api::{Contributor, PrState, PullRequest, RepoMetadata};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct RepoBody {
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub default_branch: String,
}

impl From<RepoBody> for RepoMetadata {
    fn from(body: RepoBody) -> Self {
        RepoMetadata {
            full_name: body.full_name,
            description: body.description,
            stars: body.stargazers_count,
            forks: body.forks_count,
            default_branch: body.default_branch,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct PullRequestBody {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: PrState,
    pub user: Option<UserBody>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct UserBody {
    pub login: String,
}

impl From<PullRequestBody> for PullRequest {
    fn from(body: PullRequestBody) -> Self {
        PullRequest {
            number: body.number,
            title: body.title,
            state: body.state,
            author: body.user.map(|user| user.login),
            created_at: body.created_at,
            closed_at: body.closed_at,
            merged_at: body.merged_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ContributorBody {
    pub login: String,
    pub contributions: u64,
}

impl From<ContributorBody> for Contributor {
    fn from(body: ContributorBody) -> Self {
        Contributor {
            username: body.login,
            contributions: body.contributions,
            profile: None,
        }
    }
}
