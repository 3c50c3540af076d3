mod args;
pub mod charts;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::anyhow;
use github_client::GithubClientBuilder;
use log::info;
use repo_analyzer::aggregator::{Aggregator, AnalysisState, CollectionReport};
use repo_analyzer::snapshot::Snapshot;
use repo_analyzer::summary::{self, RepoSummary};
use repo_analyzer::timeseries::{self, TimePoint};
use repo_analyzer::trends::{self, TrendReport};

pub use args::Args;

/// Everything one run produces: the aggregated state plus every derived view of it.
pub struct Analysis {
    pub state: AnalysisState,
    /// Per-repository collection outcomes; absent when the state came from a snapshot.
    pub report: Option<CollectionReport>,
    pub summaries: BTreeMap<String, RepoSummary>,
    pub series: BTreeMap<String, Vec<TimePoint>>,
    pub trends: TrendReport,
    pub chart_files: Vec<PathBuf>,
}

/// Collects (or loads) repository data, snapshots it, and derives summaries, series, trends and
/// charts from the aggregated state.
pub async fn analyze(args: Args) -> anyhow::Result<Analysis> {
    let (state, report) = if args.load {
        let state = Snapshot::read_from(&args.snapshot)?.into_state()?;
        info!(
            "Loaded {} repositories from [{}]",
            state.repos.len(),
            args.snapshot.display()
        );
        (state, None)
    } else {
        let token = args.api_token.clone().ok_or_else(|| {
            anyhow!(
                "GitHub token not found. Set the GITHUB_TOKEN environment variable \
                 or pass --api-token."
            )
        })?;
        let client = GithubClientBuilder::default()
            .with_api_url(&args.api_url)
            .with_profile_url(&args.profile_url)
            .try_with_token(token)?
            .build()?;

        let mut aggregator = Aggregator::new(client);
        let report = aggregator.collect(&args.repo_ids(), args.max_profiles).await;
        let state = aggregator.into_state();

        Snapshot::from_state(&state).write_to(&args.snapshot)?;
        info!("Snapshot written to [{}]", args.snapshot.display());
        (state, Some(report))
    };

    let summaries = summary::compute_summaries(&state);
    let series = timeseries::build_time_series(&state, args.bucketing);
    let trends = trends::describe_trends(&series);
    let chart_files = charts::ChartRenderer::new()?.render_all(&summaries, &series, &args.out_dir)?;

    Ok(Analysis {
        state,
        report,
        summaries,
        series,
        trends,
        chart_files,
    })
}

/// Plain-text table of the per-repository summaries.
pub fn format_summary_table(summaries: &BTreeMap<String, RepoSummary>) -> String {
    if summaries.is_empty() {
        return "No repository data available.".to_string();
    }

    let repo_width = summaries
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Repository".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:<repo_width$}  {:>8}  {:>8}  {:>8}  {:>14}  {:>12}\n",
        "Repository",
        "Open",
        "Closed",
        "Total",
        "Unique authors",
        "Oldest PR",
        repo_width = repo_width
    ));
    for summary in summaries.values() {
        let oldest = summary
            .oldest_pr
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "{:<repo_width$}  {:>8}  {:>8}  {:>8}  {:>14}  {:>12}\n",
            summary.repo,
            summary.open_prs,
            summary.closed_prs,
            summary.open_prs + summary.closed_prs,
            summary.unique_authors,
            oldest,
            repo_width = repo_width
        ));
    }
    out
}

/// Plain-text trend report: one line per repository plus the activity ranking.
pub fn format_trend_report(report: &TrendReport) -> String {
    if report.trends.is_empty() {
        return "No time series data available for trend analysis.".to_string();
    }

    let mut out = String::from("Temporal trend analysis\n");
    for (repo, trend) in &report.trends {
        let change = trend
            .change_pct
            .map(|pct| format!("{:+.1}%", pct))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "  {}: {} (total {}, peak {} per bucket, early-to-late change {})\n",
            repo, trend.direction, trend.total, trend.peak, change
        ));
    }

    out.push_str("Ranking by total activity:\n");
    for (position, repo) in report.ranking.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} ({} pull requests)\n",
            position + 1,
            repo,
            report.trends[repo].total
        ));
    }
    out
}
