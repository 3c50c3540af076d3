//! GitHub REST implementation of [`repo_analyzer::api::Client`].
//!
//! List endpoints are fetched at `per_page=100` and followed through the `Link` header until no
//! further page is reported. HTTP failures are mapped onto the shared error taxonomy: 401 becomes
//! [`Error::Auth`], a 403 with an exhausted `x-ratelimit-remaining` becomes [`Error::RateLimit`]
//! carrying the reset timestamp, 404 becomes [`Error::NotFound`] and everything else surfaces as
//! [`Error::Transport`] with the operation and subject attached.

mod builder;
mod payload;

pub use builder::GithubClientBuilder;

use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use repo_analyzer::api::{
    Client, Contributor, Error, PullRequest, RepoId, RepoMetadata, Result, StateFilter,
};
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::payload::{ContributorBody, PullRequestBody, RepoBody};

const MAX_PAGE_SIZE: u32 = 100;
const FIRST_PAGE: u32 = 1;

pub struct GithubClient {
    /// API client carrying the auth and accept headers.
    client: reqwest::Client,
    /// Plain client for public profile pages; those are fetched without API credentials.
    profile_client: reqwest::Client,
    api_url: String,
    profile_url: String,
}

impl GithubClient {
    async fn get_api(
        &self,
        url: String,
        query: &[(String, String)],
        operation: &'static str,
        subject: &str,
    ) -> Result<Response> {
        debug!("GET {} ({} for [{}])", url, operation, subject);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|error| transport(operation, subject, error))?;
        check_status(response, operation, subject)
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        extra_query: &[(String, String)],
        operation: &'static str,
        subject: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = FIRST_PAGE;
        loop {
            let mut query = extra_query.to_vec();
            query.push(("per_page".to_string(), MAX_PAGE_SIZE.to_string()));
            query.push(("page".to_string(), page.to_string()));

            let response = self.get_api(url.to_string(), &query, operation, subject).await?;
            let has_next = next_page_reported(response.headers());
            let body: Vec<T> = response
                .json()
                .await
                .map_err(|error| transport(operation, subject, error))?;

            if body.is_empty() {
                break;
            }
            items.extend(body);
            if !has_next {
                break;
            }
            page += 1;
        }
        debug!(
            "{} for [{}] yielded {} items over {} page(s)",
            operation,
            subject,
            items.len(),
            page
        );
        Ok(items)
    }
}

#[async_trait]
impl Client for GithubClient {
    async fn repo_metadata(&self, repo: &RepoId) -> Result<RepoMetadata> {
        let operation = "metadata fetch";
        let url = format!("{}/repos/{}", self.api_url, repo);
        let response = self.get_api(url, &[], operation, &repo.full_name()).await?;
        let body: RepoBody = response
            .json()
            .await
            .map_err(|error| transport(operation, &repo.full_name(), error))?;
        Ok(body.into())
    }

    async fn pull_requests(&self, repo: &RepoId, filter: StateFilter) -> Result<Vec<PullRequest>> {
        let url = format!("{}/repos/{}/pulls", self.api_url, repo);
        let query = [
            ("state".to_string(), filter.to_string()),
            ("sort".to_string(), "created".to_string()),
            ("direction".to_string(), "desc".to_string()),
        ];
        let bodies: Vec<PullRequestBody> = self
            .get_paginated(&url, &query, "pull request listing", &repo.full_name())
            .await?;
        Ok(bodies.into_iter().map(PullRequest::from).collect())
    }

    async fn contributors(&self, repo: &RepoId) -> Result<Vec<Contributor>> {
        let url = format!("{}/repos/{}/contributors", self.api_url, repo);
        let bodies: Vec<ContributorBody> = self
            .get_paginated(&url, &[], "contributor listing", &repo.full_name())
            .await?;
        Ok(bodies.into_iter().map(Contributor::from).collect())
    }

    async fn user_profile_document(&self, username: &str) -> Result<String> {
        let operation = "profile fetch";
        let url = format!("{}/{}", self.profile_url, username);
        debug!("GET {} ({} for [{}])", url, operation, username);
        let response = self
            .profile_client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport(operation, username, error))?;
        let response = check_status(response, operation, username)?;
        response
            .text()
            .await
            .map_err(|error| transport(operation, username, error))
    }
}

fn check_status(response: Response, operation: &'static str, subject: &str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Auth(format!(
            "GitHub rejected the supplied token during {} for [{}]",
            operation, subject
        )));
    }
    if status == StatusCode::FORBIDDEN
        && read_header::<u32>(response.headers(), "x-ratelimit-remaining") == Some(0)
    {
        let reset = read_header(response.headers(), "x-ratelimit-reset").unwrap_or(0);
        return Err(Error::RateLimit { reset });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            resource: subject.to_string(),
        });
    }
    if !status.is_success() {
        return Err(Error::Transport {
            operation,
            subject: subject.to_string(),
            source: anyhow::anyhow!("GitHub responded with status {}", status),
        });
    }
    Ok(response)
}

fn next_page_reported(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|link| link.to_str().ok())
        .map(|link| link.contains(r#"rel="next""#))
        .unwrap_or(false)
}

fn read_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn transport(
    operation: &'static str,
    subject: &str,
    error: impl std::error::Error + Send + Sync + 'static,
) -> Error {
    Error::Transport {
        operation,
        subject: subject.to_string(),
        source: anyhow::Error::new(error),
    }
}
