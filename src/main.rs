use clap::Parser;
use repo_analyzer_app::{analyze, format_summary_table, format_trend_report, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let analysis = analyze(args).await?;

    if let Some(report) = &analysis.report {
        println!(
            "Collected {} repositories ({} failed)",
            report.collected.len(),
            report.failed.len()
        );
        for (repo, reason) in &report.failed {
            println!("  failed {}: {}", repo, reason);
        }
        if let Some(reset) = report.rate_limited_until {
            println!(
                "  rate limit reached (resets at unix timestamp {}); not attempted: {}",
                reset,
                report.uncollected.join(", ")
            );
        }
        println!();
    }

    println!("{}", format_summary_table(&analysis.summaries));
    println!("{}", format_trend_report(&analysis.trends));

    for file in &analysis.chart_files {
        println!("Wrote {}", file.display());
    }

    Ok(())
}
