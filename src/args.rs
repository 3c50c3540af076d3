use std::path::PathBuf;

use clap::Parser;
use repo_analyzer::api::RepoId;
use repo_analyzer::timeseries::Bucketing;
use secrecy::SecretString;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Repositories to analyze, as owner/name; a built-in set is used when none are given
    pub repos: Vec<RepoId>,

    /// API OAuth access token
    #[clap(short, long, env = "GITHUB_TOKEN")]
    pub api_token: Option<SecretString>,

    /// Repository API URL
    #[clap(long, env, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Base URL of the public profile pages
    #[clap(long, env, default_value = "https://github.com")]
    pub profile_url: String,

    /// Snapshot file holding the collected data
    #[clap(short, long, env, default_value = "github_data.json")]
    pub snapshot: PathBuf,

    /// Analyze the existing snapshot instead of querying the API
    #[clap(short, long)]
    pub load: bool,

    /// Directory receiving the rendered charts
    #[clap(short, long, env, default_value = "output")]
    pub out_dir: PathBuf,

    /// Contributor profiles to scrape per repository
    #[clap(short, long, env, default_value_t = 10)]
    pub max_profiles: usize,

    /// Time bucket of the activity series
    #[clap(short, long, env, default_value = "weekly")]
    pub bucketing: Bucketing,
}

impl Args {
    /// Repositories selected on the command line, or the built-in default set.
    pub fn repo_ids(&self) -> Vec<RepoId> {
        if self.repos.is_empty() {
            default_repos()
        } else {
            self.repos.clone()
        }
    }
}

fn default_repos() -> Vec<RepoId> {
    vec![
        RepoId::new("numpy", "numpy"),
        RepoId::new("pandas-dev", "pandas"),
        RepoId::new("django", "django"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_falls_back_to_defaults() {
        let args = Args::parse_from(["repo_analyzer"]);
        assert_eq!(args.repo_ids().len(), 3);
        assert_eq!(args.repo_ids()[0], RepoId::new("numpy", "numpy"));
    }

    #[test]
    fn positional_repos_override_defaults() {
        let args = Args::parse_from(["repo_analyzer", "rust-lang/rust"]);
        assert_eq!(args.repo_ids(), vec![RepoId::new("rust-lang", "rust")]);
    }
}
