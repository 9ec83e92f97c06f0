//! Value types shared by the aggregation engine

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{Result, TrendsError};

/// Inclusive UTC calendar date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(TrendsError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering the `days` days before `today`, plus `today` itself
    pub fn since_days(days: u32, today: NaiveDate) -> Result<Self> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| TrendsError::Config(format!("--since-days {} is out of range", days)))?;
        Self::new(start, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included
    pub fn day_count(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Start of the window as `YYYY-MM-DDT00:00:00Z`
    pub fn since_timestamp(&self) -> String {
        format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
    }

    /// Last second of the window as `YYYY-MM-DDT23:59:59Z`
    pub fn until_timestamp(&self) -> String {
        format!("{}T23:59:59Z", self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Calendar interval used as an aggregation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Granularity {
    #[value(alias = "day")]
    Daily,
    #[value(alias = "week")]
    Weekly,
    #[value(alias = "month")]
    Monthly,
}

impl Granularity {
    pub fn suffix(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

/// UTC midnight at the start of a day, ISO week or month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(NaiveDate);

impl BucketKey {
    pub(crate) fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Bucket start as a UTC instant
    pub fn as_timestamp(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0.and_time(chrono::NaiveTime::MIN))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T00:00:00Z", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One finalized `(bucket, value)` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub time: BucketKey,
    pub count: u64,
}

/// Contributor identity tagged by where it came from.
///
/// A login and an email never compare equal, even for the same person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identity {
    Login(String),
    Email(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Login(login) => write!(f, "login:{}", login),
            Identity::Email(email) => write!(f, "email:{}", email),
        }
    }
}

/// Repository coordinates (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        if owner.trim().is_empty() || name.trim().is_empty() {
            return Err(TrendsError::Config(
                "repository owner and name must not be empty".into(),
            ));
        }
        Ok(Self { owner, name })
    }
}

impl FromStr for RepoId {
    type Err = TrendsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !name.contains('/') => Self::new(owner, name),
            _ => Err(TrendsError::Config(format!(
                "expected OWNER/NAME, got `{}`",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ========== DateWindow tests ==========

    #[test]
    fn test_window_rejects_start_after_end() {
        let err = DateWindow::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, TrendsError::InvalidRange { .. }));
    }

    #[test]
    fn test_window_single_day() {
        let w = DateWindow::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(w.day_count(), 1);
        assert!(w.contains(date(2024, 1, 1)));
        assert!(!w.contains(date(2024, 1, 2)));
    }

    #[test]
    fn test_window_since_days() {
        let w = DateWindow::since_days(90, date(2024, 4, 1)).unwrap();
        assert_eq!(w.start(), date(2024, 1, 2));
        assert_eq!(w.end(), date(2024, 4, 1));
        assert_eq!(w.day_count(), 91);
    }

    #[test]
    fn test_window_timestamps() {
        let w = DateWindow::new(date(2024, 1, 1), date(2024, 1, 21)).unwrap();
        assert_eq!(w.since_timestamp(), "2024-01-01T00:00:00Z");
        assert_eq!(w.until_timestamp(), "2024-01-21T23:59:59Z");
        assert_eq!(w.to_string(), "2024-01-01..2024-01-21");
    }

    // ========== BucketKey tests ==========

    #[test]
    fn test_bucket_key_display() {
        let key = BucketKey::from_date(date(2024, 1, 8));
        assert_eq!(key.to_string(), "2024-01-08T00:00:00Z");
        assert_eq!(key.as_timestamp().to_rfc3339(), "2024-01-08T00:00:00+00:00");
    }

    #[test]
    fn test_bucket_count_serializes_time_as_string() {
        let row = BucketCount {
            time: BucketKey::from_date(date(2024, 3, 1)),
            count: 4,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"time":"2024-03-01T00:00:00Z","count":4}"#);
    }

    // ========== Identity tests ==========

    #[test]
    fn test_identity_provenance_tags() {
        assert_eq!(Identity::Login("alice".into()).to_string(), "login:alice");
        assert_eq!(
            Identity::Email("alice@example.com".into()).to_string(),
            "email:alice@example.com"
        );
        assert_ne!(Identity::Login("x".into()), Identity::Email("x".into()));
    }

    // ========== RepoId tests ==========

    #[test]
    fn test_repo_id_parse() {
        let repo: RepoId = "valkey-io/valkey".parse().unwrap();
        assert_eq!(repo.owner, "valkey-io");
        assert_eq!(repo.name, "valkey");
        assert_eq!(repo.to_string(), "valkey-io/valkey");
    }

    #[test]
    fn test_repo_id_parse_invalid() {
        assert!("valkey".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
        assert!("/valkey".parse::<RepoId>().is_err());
    }
}
