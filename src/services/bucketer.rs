//! Maps event timestamps onto calendar bucket keys (UTC)

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use crate::types::{BucketKey, Granularity, Result, TrendsError};

pub struct TimeBucketer;

impl TimeBucketer {
    /// Bucket start for `timestamp`: same day, the Monday on or before, or the 1st
    pub fn bucket(timestamp: &DateTime<Utc>, granularity: Granularity) -> BucketKey {
        BucketKey::from_date(Self::truncate(timestamp.date_naive(), granularity))
    }

    /// Parse an RFC 3339 timestamp and bucket it
    pub fn bucket_str(raw: &str, granularity: Granularity) -> Result<BucketKey> {
        let ts = Self::parse_timestamp(raw)?;
        Ok(Self::bucket(&ts, granularity))
    }

    /// `2025-09-12T12:35:18Z`, or any RFC 3339 offset, converted to UTC
    pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| TrendsError::MalformedTimestamp(format!("`{}`: {}", raw, e)))
    }

    fn truncate(date: NaiveDate, granularity: Granularity) -> NaiveDate {
        match granularity {
            Granularity::Daily => date,
            Granularity::Weekly => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(offset)).unwrap_or(date)
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}
