//! Paginated retrieval of one query's records
//!
//! Pages are requested strictly in order. Pagination ends on a short page,
//! a `Link` header without `rel="next"`, or the max-page safety cap.

use std::thread::sleep;
use std::time::Duration;

use serde_json::Value;

use crate::github::{EventRecord, HttpRequest, HttpTransport, Query, Transport, DEFAULT_API_URL};
use crate::services::rate_limit::{RateLimitGuard, RateLimitPolicy};
use crate::types::{Result, TrendsError};

/// GitHub's maximum page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page size
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default max pages (search API caps at 1,000 results)
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Default pause between page requests
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection and pacing settings for a fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_url: String,
    /// Bearer credential; absent means unauthenticated (lower rate limit)
    pub token: Option<String>,
    pub page_size: u32,
    pub max_pages: u32,
    pub pause: Duration,
    pub timeout: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            pause: DEFAULT_PAUSE,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(TrendsError::Config(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.max_pages == 0 {
            return Err(TrendsError::Config("max pages must be at least 1".into()));
        }
        if self.api_url.trim().is_empty() {
            return Err(TrendsError::Config("API URL must not be empty".into()));
        }
        Ok(())
    }
}

/// Records of one query plus what the server said about completeness
#[derive(Debug, Default)]
pub struct FetchedPages {
    pub records: Vec<EventRecord>,
    pub pages: u32,
    /// Some search page reported `incomplete_results` (server-side timeout)
    pub incomplete: bool,
}

pub struct PaginatedFetcher<T: Transport = HttpTransport> {
    transport: T,
    config: FetchConfig,
    guard: RateLimitGuard,
}

impl PaginatedFetcher<HttpTransport> {
    /// Fetcher over the real GitHub API
    pub fn new(config: FetchConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.token.as_deref(), config.timeout)?;
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> PaginatedFetcher<T> {
    pub fn with_transport(transport: T, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let guard = RateLimitGuard::new(config.rate_limit);
        Ok(Self {
            transport,
            config,
            guard,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Every record for `query`, across all pages
    pub fn fetch_all(&self, query: &Query) -> Result<Vec<EventRecord>> {
        self.fetch(query).map(|fetched| fetched.records)
    }

    pub fn fetch(&self, query: &Query) -> Result<FetchedPages> {
        let page_size = self.config.page_size;
        let label = query.to_string();
        let base_url = format!("{}{}", self.config.api_url.trim_end_matches('/'), query.path());

        let mut records = Vec::new();
        let mut incomplete = false;
        let mut page = 1u32;
        let mut next_url: Option<String> = None;

        loop {
            let request = match next_url.take() {
                Some(url) => HttpRequest {
                    url,
                    params: Vec::new(),
                },
                None => HttpRequest {
                    url: base_url.clone(),
                    params: query.params(page_size, page),
                },
            };

            log::debug!("GET {} (page {}) `{}`", request.url, page, label);
            let response = self
                .guard
                .execute(&label, page, || self.transport.get(&request))?;

            let (batch, page_incomplete) = page_items(query, &response.body, page)?;
            if page_incomplete {
                log::warn!(
                    "Search timed out server-side on page {} of `{}`; counts may be low",
                    page,
                    label
                );
                incomplete = true;
            }
            let batch_len = batch.len();
            records.extend(decode_records(batch, page));

            if batch_len < page_size as usize {
                break;
            }

            if response.link.is_some() {
                match response.next_link() {
                    Some(url) => next_url = Some(url),
                    None => break,
                }
            }

            if page >= self.config.max_pages {
                log::warn!(
                    "Stopped after {} pages for `{}`; narrow the window or raise --max-pages",
                    page,
                    label
                );
                break;
            }

            page += 1;
            if !self.config.pause.is_zero() {
                sleep(self.config.pause);
            }
        }

        log::debug!("{} records across {} page(s) for `{}`", records.len(), page, label);
        Ok(FetchedPages {
            records,
            pages: page,
            incomplete,
        })
    }
}

/// Pull the record array out of a page body, with its `incomplete_results` flag
fn page_items(query: &Query, body: &str, page: u32) -> Result<(Vec<Value>, bool)> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TrendsError::Parse(format!("page {} of `{}`: {}", page, query, e)))?;

    let incomplete = value
        .get("incomplete_results")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let items = match query.items_key() {
        Some(key) => value.get(key).cloned(),
        None => Some(value),
    };

    match items {
        Some(Value::Array(items)) => Ok((items, incomplete)),
        _ => Err(TrendsError::Parse(format!(
            "page {} of `{}`: expected a JSON array of records",
            page, query
        ))),
    }
}

/// Decode records, skipping ones whose shape cannot be read
fn decode_records(items: Vec<Value>, page: u32) -> Vec<EventRecord> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<EventRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::debug!("Skipping undecodable record on page {}: {}", page, e);
                None
            }
        })
        .collect()
}
