//! GitHub repository analysis
//!
//! # Overview
//!
//! Library for collecting and analyzing pull-request activity across a set of GitHub repositories.
//! Given a list of repositories (`owner/name`), the [`aggregator::Aggregator`] fetches each
//! repository's metadata, its full pull-request history and its contributor list through an
//! [`api::Client`] implementation, optionally scraping a handful of contributor profile pages for
//! extra fields.
//! The collected state can be written to a versioned [`snapshot::Snapshot`] file and analyzed
//! later without touching the API again: [`summary`] computes per-repository counts,
//! [`timeseries`] buckets pull-request creation into daily or weekly periods, and [`trends`]
//! labels each repository's activity as increasing, decreasing or flat and ranks repositories by
//! total activity.
//!
//! A failure while collecting one repository is recorded against that repository and does not
//! abort the others; an exhausted API quota is the one exception, surfaced as
//! [`api::Error::RateLimit`] so the caller can wait and re-run instead of burning requests.

pub mod aggregator;
pub mod api;
pub mod profile;
pub mod snapshot;
pub mod summary;
pub mod timeseries;
pub mod trends;
