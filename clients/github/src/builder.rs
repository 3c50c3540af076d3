use repo_analyzer::api::{Error, Result};
use reqwest::header;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::ClientBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::GithubClient;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_PROFILE_URL: &str = "https://github.com";
const USER_AGENT: &str = "repo-analyzer";

pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    api_url: String,
    profile_url: String,
    headers: HeaderMap,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        GithubClientBuilder {
            client_builder: ClientBuilder::default(),
            api_url: DEFAULT_API_URL.to_string(),
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            headers,
        }
    }
}

impl GithubClientBuilder {
    pub fn try_with_token(self, token: SecretString) -> Result<GithubClientBuilder> {
        let value = format!("token {}", token.expose_secret());
        self.try_with_sensitive_header(header::AUTHORIZATION, &value)
    }

    pub fn with_api_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.api_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Base URL of the public profile pages; only scraping goes through it.
    pub fn with_profile_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.profile_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    fn try_with_sensitive_header(
        mut self,
        key: HeaderName,
        val: &str,
    ) -> Result<GithubClientBuilder> {
        let mut val = HeaderValue::from_str(val)
            .map_err(|error| Error::Auth(format!("token is not a valid header value: {}", error)))?;
        val.set_sensitive(true);
        self.headers.insert(key, val);
        Ok(self)
    }

    pub fn build(self) -> Result<GithubClient> {
        let client = self
            .client_builder
            .default_headers(self.headers)
            .build()
            .map_err(|error| Error::Other(anyhow::Error::new(error)))?;
        let profile_client = ClientBuilder::default()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| Error::Other(anyhow::Error::new(error)))?;
        Ok(GithubClient {
            client,
            profile_client,
            api_url: self.api_url,
            profile_url: self.profile_url,
        })
    }
}
