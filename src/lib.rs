//! Time-bucketed GitHub activity trends
//!
//! Collects pull requests, issues, commits and releases from the GitHub REST
//! API over a date window and aggregates them into calendar-aligned
//! `(time, count)` series for dashboards.

pub mod cli;
pub mod github;
pub mod services;
pub mod types;
