//! Splits a query window into chunks small enough for the search API
//!
//! GitHub search returns at most 1,000 results per query, so busy
//! repositories need the date range narrowed per request.

use chrono::{Days, NaiveDate};

use crate::types::{DateWindow, Result, TrendsError};

/// Default chunk size in days
pub const DEFAULT_CHUNK_DAYS: u32 = 30;

pub struct WindowPlanner;

impl WindowPlanner {
    /// Ascending, contiguous chunks of at most `chunk_days` days covering `window`
    pub fn plan(window: &DateWindow, chunk_days: u32) -> Result<Vec<DateWindow>> {
        if chunk_days == 0 {
            return Err(TrendsError::Config("chunk size must be at least 1 day".into()));
        }

        let span = Days::new(u64::from(chunk_days - 1));
        let mut chunks = Vec::with_capacity(
            usize::try_from(window.day_count().div_ceil(u64::from(chunk_days))).unwrap_or(0),
        );
        let mut start = window.start();

        loop {
            let end = start
                .checked_add_days(span)
                .map_or(window.end(), |e| e.min(window.end()));
            chunks.push(DateWindow::new(start, end)?);

            match end.succ_opt() {
                Some(next) if end < window.end() => start = next,
                _ => break,
            }
        }

        Ok(chunks)
    }

    /// Plan from raw dates, rejecting an inverted range before any request
    pub fn plan_dates(start: NaiveDate, end: NaiveDate, chunk_days: u32) -> Result<Vec<DateWindow>> {
        let window = DateWindow::new(start, end)?;
        Self::plan(&window, chunk_days)
    }
}
