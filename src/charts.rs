//! SVG chart rendering over summaries and time series.
//!
//! Layout coordinates are computed here; the handlebars templates only place pre-scaled shapes,
//! so no analysis logic lives in the template files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Datelike;
use handlebars::Handlebars;
use log::warn;
use repo_analyzer::summary::RepoSummary;
use repo_analyzer::timeseries::TimePoint;
use serde::Serialize;

const BAR_TEMPLATE: &str = include_str!("charts/bar_chart.hbs");
const LINE_TEMPLATE: &str = include_str!("charts/line_chart.hbs");

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 480.0;
const PLOT_LEFT: f64 = 70.0;
const PLOT_RIGHT: f64 = 870.0;
const PLOT_TOP: f64 = 50.0;
const PLOT_BOTTOM: f64 = 420.0;

const OPEN_COLOR: &str = "#2ecc71";
const CLOSED_COLOR: &str = "#3498db";
const SERIES_COLORS: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

#[derive(Serialize)]
struct ChartFrame {
    title: String,
    width: f64,
    height: f64,
    plot_left: f64,
    plot_right: f64,
    plot_top: f64,
    plot_bottom: f64,
    tick_label_x: f64,
    x_label_y: f64,
    y_ticks: Vec<Tick>,
    x_labels: Vec<AxisLabel>,
    legend: Vec<LegendEntry>,
}

#[derive(Serialize)]
struct BarChart {
    #[serde(flatten)]
    frame: ChartFrame,
    bars: Vec<Bar>,
}

#[derive(Serialize)]
struct LineChart {
    #[serde(flatten)]
    frame: ChartFrame,
    lines: Vec<Line>,
}

#[derive(Serialize)]
struct Bar {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: String,
    value: u64,
    value_x: f64,
    value_y: f64,
}

#[derive(Serialize)]
struct Line {
    points: String,
    color: String,
}

#[derive(Serialize)]
struct Tick {
    y: f64,
    label: String,
}

#[derive(Serialize)]
struct AxisLabel {
    x: f64,
    text: String,
}

#[derive(Serialize)]
struct LegendEntry {
    swatch_x: f64,
    swatch_y: f64,
    text_x: f64,
    text_y: f64,
    color: String,
    label: String,
}

pub struct ChartRenderer {
    registry: Handlebars<'static>,
}

impl ChartRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string("bar_chart", BAR_TEMPLATE)
            .context("bar chart template is malformed")?;
        registry
            .register_template_string("line_chart", LINE_TEMPLATE)
            .context("line chart template is malformed")?;
        Ok(ChartRenderer { registry })
    }

    /// Renders every chart with data behind it into `out_dir` and returns the written files.
    pub fn render_all(
        &self,
        summaries: &BTreeMap<String, RepoSummary>,
        series: &BTreeMap<String, Vec<TimePoint>>,
        out_dir: &Path,
    ) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("could not create output directory [{}]", out_dir.display()))?;

        let mut files = Vec::new();
        let mut write = |name: &str, svg: Option<String>| -> anyhow::Result<()> {
            match svg {
                Some(svg) => {
                    let path = out_dir.join(name);
                    fs::write(&path, svg)
                        .with_context(|| format!("could not write chart [{}]", path.display()))?;
                    files.push(path);
                }
                None => warn!("No data for chart [{}]; skipping", name),
            }
            Ok(())
        };

        write("pr_status_distribution.svg", self.status_distribution(summaries)?)?;
        write("unique_users.svg", self.unique_users(summaries)?)?;
        write("pr_timeline.svg", self.timeline(series, false)?)?;
        write("cumulative_activity.svg", self.timeline(series, true)?)?;

        Ok(files)
    }

    /// Grouped open/closed bars per repository.
    fn status_distribution(
        &self,
        summaries: &BTreeMap<String, RepoSummary>,
    ) -> anyhow::Result<Option<String>> {
        if summaries.is_empty() {
            return Ok(None);
        }

        let max_value = summaries
            .values()
            .map(|summary| summary.open_prs.max(summary.closed_prs))
            .max()
            .unwrap_or(0);
        let mut frame = frame("Pull Request Status Distribution", max_value);
        frame.legend = vec![
            legend_entry(0, OPEN_COLOR, "open"),
            legend_entry(1, CLOSED_COLOR, "closed"),
        ];

        let slot = (PLOT_RIGHT - PLOT_LEFT) / summaries.len() as f64;
        let bar_width = (slot * 0.35).min(60.0);
        let mut bars = Vec::new();
        for (index, summary) in summaries.values().enumerate() {
            let center = PLOT_LEFT + slot * (index as f64 + 0.5);
            bars.push(bar(center - bar_width, bar_width, summary.open_prs, max_value, OPEN_COLOR));
            bars.push(bar(center, bar_width, summary.closed_prs, max_value, CLOSED_COLOR));
            frame.x_labels.push(AxisLabel {
                x: center,
                text: summary.repo.clone(),
            });
        }

        let chart = BarChart { frame, bars };
        Ok(Some(self.registry.render("bar_chart", &chart)?))
    }

    /// One bar per repository with its distinct-author count.
    fn unique_users(
        &self,
        summaries: &BTreeMap<String, RepoSummary>,
    ) -> anyhow::Result<Option<String>> {
        if summaries.is_empty() {
            return Ok(None);
        }

        let max_value = summaries
            .values()
            .map(|summary| summary.unique_authors)
            .max()
            .unwrap_or(0);
        let mut frame = frame("Unique Contributors by Repository", max_value);

        let slot = (PLOT_RIGHT - PLOT_LEFT) / summaries.len() as f64;
        let bar_width = (slot * 0.5).min(90.0);
        let mut bars = Vec::new();
        for (index, summary) in summaries.values().enumerate() {
            let center = PLOT_LEFT + slot * (index as f64 + 0.5);
            let color = SERIES_COLORS[index % SERIES_COLORS.len()];
            bars.push(bar(
                center - bar_width / 2.0,
                bar_width,
                summary.unique_authors,
                max_value,
                color,
            ));
            frame.x_labels.push(AxisLabel {
                x: center,
                text: summary.repo.clone(),
            });
        }

        let chart = BarChart { frame, bars };
        Ok(Some(self.registry.render("bar_chart", &chart)?))
    }

    /// One polyline per repository; `cumulative` plots running totals instead of bucket counts.
    fn timeline(
        &self,
        series: &BTreeMap<String, Vec<TimePoint>>,
        cumulative: bool,
    ) -> anyhow::Result<Option<String>> {
        let populated: Vec<(&String, Vec<(i64, u64)>)> = series
            .iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(repo, points)| (repo, scale_counts(points, cumulative)))
            .collect();
        if populated.is_empty() {
            return Ok(None);
        }

        let first_day = populated
            .iter()
            .flat_map(|(_, points)| points.first().map(|(day, _)| *day))
            .min()
            .unwrap_or(0);
        let last_day = populated
            .iter()
            .flat_map(|(_, points)| points.last().map(|(day, _)| *day))
            .max()
            .unwrap_or(0);
        let span = (last_day - first_day).max(1) as f64;
        let max_value = populated
            .iter()
            .flat_map(|(_, points)| points.iter().map(|(_, count)| *count))
            .max()
            .unwrap_or(0);

        let title = if cumulative {
            "Cumulative Pull Request Growth"
        } else {
            "Pull Request Activity Over Time"
        };
        let mut frame = frame(title, max_value);
        for (index, (repo, _)) in populated.iter().enumerate() {
            frame.legend.push(legend_entry(
                index,
                SERIES_COLORS[index % SERIES_COLORS.len()],
                repo.as_str(),
            ));
        }
        frame.x_labels = date_axis_labels(series, first_day, last_day, span);

        let lines = populated
            .iter()
            .enumerate()
            .map(|(index, (_, points))| Line {
                color: SERIES_COLORS[index % SERIES_COLORS.len()].to_string(),
                points: points
                    .iter()
                    .map(|(day, count)| {
                        let x = PLOT_LEFT
                            + (*day - first_day) as f64 / span * (PLOT_RIGHT - PLOT_LEFT);
                        let y = scale_y(*count, max_value);
                        format!("{:.1},{:.1}", x, y)
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            })
            .collect();

        let chart = LineChart { frame, lines };
        Ok(Some(self.registry.render("line_chart", &chart)?))
    }
}

fn frame(title: &str, max_value: u64) -> ChartFrame {
    let y_ticks = (0..=4)
        .map(|step| {
            let value = max_value as f64 * step as f64 / 4.0;
            Tick {
                y: scale_y_f(value, max_value),
                label: format!("{}", value.round() as u64),
            }
        })
        .collect();
    ChartFrame {
        title: title.to_string(),
        width: WIDTH,
        height: HEIGHT,
        plot_left: PLOT_LEFT,
        plot_right: PLOT_RIGHT,
        plot_top: PLOT_TOP,
        plot_bottom: PLOT_BOTTOM,
        tick_label_x: PLOT_LEFT - 8.0,
        x_label_y: PLOT_BOTTOM + 18.0,
        y_ticks,
        x_labels: Vec::new(),
        legend: Vec::new(),
    }
}

fn bar(x: f64, width: f64, value: u64, max_value: u64, color: &str) -> Bar {
    let y = scale_y(value, max_value);
    Bar {
        x,
        y,
        w: width,
        h: PLOT_BOTTOM - y,
        color: color.to_string(),
        value,
        value_x: x + width / 2.0,
        value_y: y - 4.0,
    }
}

fn legend_entry(index: usize, color: &str, label: &str) -> LegendEntry {
    let x = PLOT_LEFT + index as f64 * 160.0;
    LegendEntry {
        swatch_x: x,
        swatch_y: 30.0,
        text_x: x + 18.0,
        text_y: 40.0,
        color: color.to_string(),
        label: label.to_string(),
    }
}

fn scale_y(value: u64, max_value: u64) -> f64 {
    scale_y_f(value as f64, max_value)
}

fn scale_y_f(value: f64, max_value: u64) -> f64 {
    if max_value == 0 {
        return PLOT_BOTTOM;
    }
    PLOT_BOTTOM - value / max_value as f64 * (PLOT_BOTTOM - PLOT_TOP)
}

/// Day offsets from the epoch paired with bucket counts, optionally accumulated.
fn scale_counts(points: &[TimePoint], cumulative: bool) -> Vec<(i64, u64)> {
    let mut running = 0;
    points
        .iter()
        .map(|point| {
            let count = if cumulative {
                running += point.count;
                running
            } else {
                point.count
            };
            (point.period.num_days_from_ce() as i64, count)
        })
        .collect()
}

fn date_axis_labels(
    series: &BTreeMap<String, Vec<TimePoint>>,
    first_day: i64,
    last_day: i64,
    span: f64,
) -> Vec<AxisLabel> {
    let mut labels = Vec::new();
    let all_points = series.values().flatten();
    let mut dates: Vec<_> = all_points.map(|point| point.period).collect();
    dates.sort();
    dates.dedup();
    for date in [dates.first(), dates.last()].into_iter().flatten() {
        let day = date.num_days_from_ce() as i64;
        if day < first_day || day > last_day {
            continue;
        }
        labels.push(AxisLabel {
            x: PLOT_LEFT + (day - first_day) as f64 / span * (PLOT_RIGHT - PLOT_LEFT),
            text: date.format("%Y-%m-%d").to_string(),
        });
    }
    labels
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn summaries() -> BTreeMap<String, RepoSummary> {
        let mut map = BTreeMap::new();
        for (repo, open, closed, authors) in
            [("octo/demo", 2, 1, 2), ("octo/other", 0, 4, 3)]
        {
            map.insert(
                repo.to_string(),
                RepoSummary {
                    repo: repo.to_string(),
                    open_prs: open,
                    closed_prs: closed,
                    unique_authors: authors,
                    oldest_pr: None,
                },
            );
        }
        map
    }

    fn series() -> BTreeMap<String, Vec<TimePoint>> {
        let mut map = BTreeMap::new();
        map.insert(
            "octo/demo".to_string(),
            (0..5)
                .map(|offset| TimePoint {
                    period: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
                        + chrono::Duration::days(offset),
                    count: offset as u64,
                })
                .collect(),
        );
        map
    }

    #[test]
    fn status_chart_has_two_bars_per_repository() {
        let renderer = ChartRenderer::new().unwrap();
        let svg = renderer.status_distribution(&summaries()).unwrap().unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect class=\"bar\"").count(), 4);
        assert!(svg.contains(OPEN_COLOR));
        assert!(svg.contains(CLOSED_COLOR));
    }

    #[test]
    fn timeline_draws_one_polyline_per_series() {
        let renderer = ChartRenderer::new().unwrap();
        let svg = renderer.timeline(&series(), false).unwrap().unwrap();
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("2024-02-01"));
    }

    #[test]
    fn empty_inputs_render_nothing() {
        let renderer = ChartRenderer::new().unwrap();
        assert!(renderer.status_distribution(&BTreeMap::new()).unwrap().is_none());
        assert!(renderer.timeline(&BTreeMap::new(), true).unwrap().is_none());
    }
}
