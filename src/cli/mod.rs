mod dashboard;
mod export;

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

pub use dashboard::DashboardArgs;
pub use export::ExportArgs;

use crate::github::DEFAULT_API_URL;
use crate::services::fetcher::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::services::rate_limit::{
    DEFAULT_MAX_RATE_LIMIT_RETRIES, DEFAULT_RATE_LIMIT_MAX_BACKOFF, DEFAULT_RATE_LIMIT_MAX_WAIT,
};
use crate::services::window_planner::DEFAULT_CHUNK_DAYS;
use crate::services::{FetchConfig, PaginatedFetcher, RateLimitPolicy, TrendConfig, TrendService};
use crate::types::{DateWindow, RepoId, Result, TrendsError};

/// Default look-back when no explicit start date is given
pub const DEFAULT_SINCE_DAYS: u32 = 90;

/// Time-bucketed GitHub activity trends for dashboards
#[derive(Parser)]
#[command(name = "ghtrends")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one metric as a time,count series
    Export(ExportArgs),

    /// Write the full weekly/monthly CSV set for a dashboard
    Dashboard(DashboardArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let today = Utc::now().date_naive();
        match self.command {
            Commands::Export(args) => args.run(today)?,
            Commands::Dashboard(args) => args.run(today)?,
        }
        Ok(())
    }
}

/// Repository, window and fetch options shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Repository as `owner/name`, or just the name together with --owner
    #[arg(long)]
    pub repo: String,

    /// Repository owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Look back this many days from --until
    #[arg(long, default_value_t = DEFAULT_SINCE_DAYS, conflicts_with = "since")]
    pub since_days: u32,

    /// First day of the window (UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<NaiveDate>,

    /// Last day of the window (UTC, default today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub until: Option<NaiveDate>,

    /// Days per query chunk (keeps searches under the 1,000 result cap)
    #[arg(long, default_value_t = DEFAULT_CHUNK_DAYS)]
    pub chunk_days: u32,

    /// Records per page (max 100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Safety cap on pages per query
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Seconds to pause between page requests
    #[arg(long, default_value_t = 0.5, value_name = "SECS")]
    pub pause: f64,

    /// Seconds to wait after the first rate-limit response (doubles per retry)
    #[arg(long, default_value_t = 5.0, value_name = "SECS")]
    pub rate_limit_backoff: f64,

    /// Longest wait honoured when the server names one (Retry-After or quota reset)
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_MAX_WAIT.as_secs_f64(), value_name = "SECS")]
    pub rate_limit_max_wait: f64,

    /// Rate-limit retries per page before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RATE_LIMIT_RETRIES)]
    pub max_rate_limit_retries: u32,

    /// Ignore `[bot]` accounts when counting contributors
    #[arg(long)]
    pub exclude_bots: bool,

    /// API token (unauthenticated requests get a much lower rate limit)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl CommonArgs {
    pub fn repo_id(&self) -> Result<RepoId> {
        match &self.owner {
            Some(owner) => RepoId::new(owner.as_str(), self.repo.as_str()),
            None => self.repo.parse(),
        }
    }

    /// Window ending at --until (or `today`)
    pub fn window(&self, today: NaiveDate) -> Result<DateWindow> {
        let until = self.until.unwrap_or(today);
        match self.since {
            Some(since) => DateWindow::new(since, until),
            None => DateWindow::since_days(self.since_days, until),
        }
    }

    pub fn fetch_config(&self) -> Result<FetchConfig> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);
        if token.is_none() {
            log::warn!("No GITHUB_TOKEN set; unauthenticated requests are heavily rate limited");
        }

        Ok(FetchConfig {
            api_url: self.api_url.clone(),
            token,
            page_size: self.page_size,
            max_pages: self.max_pages,
            pause: seconds("--pause", self.pause)?,
            rate_limit: RateLimitPolicy {
                initial_backoff: seconds("--rate-limit-backoff", self.rate_limit_backoff)?,
                max_backoff: DEFAULT_RATE_LIMIT_MAX_BACKOFF,
                max_wait: seconds("--rate-limit-max-wait", self.rate_limit_max_wait)?,
                max_retries: self.max_rate_limit_retries,
            },
            ..Default::default()
        })
    }

    pub fn trend_config(&self, today: NaiveDate) -> Result<TrendConfig> {
        Ok(TrendConfig {
            repo: self.repo_id()?,
            window: self.window(today)?,
            chunk_days: self.chunk_days,
            exclude_bots: self.exclude_bots,
        })
    }

    /// Service over the live API
    pub fn service(&self, today: NaiveDate) -> Result<TrendService> {
        let config = self.trend_config(today)?;
        let fetcher = PaginatedFetcher::new(self.fetch_config()?)?;
        log::info!("{} over {} ({} days)", config.repo, config.window, config.window.day_count());
        Ok(TrendService::new(fetcher, config))
    }
}

fn seconds(option: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| TrendsError::Config(format!("{} must be a non-negative number of seconds", option)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::OutputFormat;
    use crate::types::{Granularity, MetricKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn export(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["ghtrends", "export"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Export(args) => args,
            Commands::Dashboard(_) => panic!("expected export"),
        }
    }

    // ========== parsing tests ==========

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["ghtrends"]).is_err());
    }

    #[test]
    fn test_cli_parse_export_defaults() {
        let args = export(&["--repo", "valkey-io/valkey"]);
        assert_eq!(args.metric, MetricKind::PrsOpened);
        assert_eq!(args.bucket, None);
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(args.out.is_none());
        assert_eq!(args.common.since_days, DEFAULT_SINCE_DAYS);
        assert_eq!(args.common.chunk_days, 30);
        assert_eq!(args.common.page_size, 100);
        assert_eq!(args.common.max_pages, 10);
        assert!(!args.common.exclude_bots);
        assert_eq!(args.common.rate_limit_max_wait, 3600.0);
    }

    #[test]
    fn test_cli_parse_export_options() {
        let args = export(&[
            "--owner",
            "valkey-io",
            "--repo",
            "valkey",
            "--metric",
            "contributors",
            "--bucket",
            "month",
            "--format",
            "json",
            "--exclude-bots",
            "--since",
            "2024-01-01",
            "--until",
            "2024-03-31",
        ]);
        assert_eq!(args.metric, MetricKind::Contributors);
        assert_eq!(args.bucket, Some(Granularity::Monthly));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.common.exclude_bots);
        assert_eq!(args.common.repo_id().unwrap().to_string(), "valkey-io/valkey");
        let window = args.common.window(date(2030, 1, 1)).unwrap();
        assert_eq!(window.start(), date(2024, 1, 1));
        assert_eq!(window.end(), date(2024, 3, 31));
    }

    #[test]
    fn test_cli_since_conflicts_with_since_days() {
        let result = Cli::try_parse_from([
            "ghtrends", "export", "--repo", "o/r", "--since", "2024-01-01", "--since-days", "7",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let result = Cli::try_parse_from(["ghtrends", "export", "--repo", "o/r", "--since", "Jan 1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_repeated_labels() {
        let args = export(&["--repo", "o/r", "--metric", "issues-opened", "--label", "bug", "--label", "Major decision pending"]);
        assert_eq!(args.labels, vec!["bug", "Major decision pending"]);
    }

    #[test]
    fn test_cli_parse_dashboard_labels() {
        let cli = Cli::try_parse_from([
            "ghtrends",
            "dashboard",
            "--repo",
            "o/r",
            "--labels",
            "enhancement,Major decision pending",
            "--out-dir",
            "data",
        ])
        .unwrap();
        match cli.command {
            Commands::Dashboard(args) => {
                assert_eq!(args.labels, vec!["enhancement", "Major decision pending"]);
                assert_eq!(args.out_dir, std::path::PathBuf::from("data"));
            }
            Commands::Export(_) => panic!("expected dashboard"),
        }
    }

    // ========== config derivation tests ==========

    #[test]
    fn test_window_since_days_relative_to_until() {
        let args = export(&["--repo", "o/r", "--since-days", "20", "--until", "2024-01-21"]);
        let window = args.common.window(date(2030, 1, 1)).unwrap();
        assert_eq!(window.start(), date(2024, 1, 1));
        assert_eq!(window.end(), date(2024, 1, 21));
    }

    #[test]
    fn test_window_inverted_is_invalid_range() {
        let args = export(&["--repo", "o/r", "--since", "2024-02-01", "--until", "2024-01-01"]);
        let err = args.common.window(date(2030, 1, 1)).unwrap_err();
        assert!(matches!(err, TrendsError::InvalidRange { .. }));
    }

    #[test]
    fn test_repo_without_owner_must_be_qualified() {
        let args = export(&["--repo", "valkey"]);
        assert!(args.common.repo_id().is_err());
    }

    #[test]
    fn test_fetch_config_from_args() {
        let args = export(&[
            "--repo",
            "o/r",
            "--token",
            "  secret ",
            "--pause",
            "0",
            "--rate-limit-backoff",
            "1.5",
            "--max-rate-limit-retries",
            "2",
            "--rate-limit-max-wait",
            "120",
            "--api-url",
            "http://localhost:9000",
        ]);
        let config = args.common.fetch_config().unwrap();
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.pause, Duration::ZERO);
        assert_eq!(config.rate_limit.initial_backoff, Duration::from_millis(1500));
        assert_eq!(config.rate_limit.max_retries, 2);
        assert_eq!(config.rate_limit.max_wait, Duration::from_secs(120));
        assert_eq!(config.api_url, "http://localhost:9000");
    }

    #[test]
    fn test_fetch_config_rejects_negative_pause() {
        let args = export(&["--repo", "o/r", "--pause=-1"]);
        assert!(matches!(args.common.fetch_config(), Err(TrendsError::Config(_))));
    }
}
