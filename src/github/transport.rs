//! HTTP transport for the GitHub REST API
//!
//! The fetcher talks to a [`Transport`] so that pagination and rate-limit
//! handling can be exercised without a network.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, RETRY_AFTER};

use crate::types::{Result, TrendsError};

/// User agent sent with every request
const USER_AGENT: &str = concat!("ghtrends/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API version header value
const API_VERSION: &str = "2022-11-28";

/// A single GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// The parts of a response the fetcher inspects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Raw `Link` header
    pub link: Option<String>,
    /// `Retry-After` in seconds
    pub retry_after: Option<u64>,
    /// `x-ratelimit-remaining`
    pub rate_limit_remaining: Option<u64>,
    /// `x-ratelimit-reset` (epoch seconds)
    pub rate_limit_reset: Option<i64>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 429, or a 403 that GitHub uses for primary/secondary rate limits
    pub fn is_rate_limited(&self) -> bool {
        match self.status {
            429 => true,
            403 => {
                self.rate_limit_remaining == Some(0)
                    || self.retry_after.is_some()
                    || self.body.to_ascii_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }

    /// Wait the server asked for: `Retry-After`, else time until the quota
    /// resets when it is used up
    pub fn server_wait(&self, now_epoch: i64) -> Option<Duration> {
        if let Some(secs) = self.retry_after {
            return Some(Duration::from_secs(secs));
        }
        match (self.rate_limit_remaining, self.rate_limit_reset) {
            (Some(0), Some(reset)) => {
                // One extra second so the retry lands after the reset
                let secs = reset.saturating_sub(now_epoch).max(0).unsigned_abs();
                Some(Duration::from_secs(secs + 1))
            }
            _ => None,
        }
    }

    /// `next` cursor from the `Link` header, if any
    pub fn next_link(&self) -> Option<String> {
        self.link.as_deref().and_then(parse_next_link)
    }
}

/// Blocking GET capability
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Extract the `rel="next"` URL from a `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    static NEXT: OnceLock<Regex> = OnceLock::new();
    let re = NEXT.get_or_init(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("valid regex"));
    header
        .split(',')
        .find_map(|part| re.captures(part))
        .map(|caps| caps[1].to_string())
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a client; `token` becomes a bearer `Authorization` header
    pub fn new(token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| TrendsError::Config(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TrendsError::Http(format!("HTTP client error: {}", e)))?;

        Ok(Self { client })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl Transport for HttpTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.get(&request.url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        let response = builder
            .send()
            .map_err(|e| TrendsError::Http(format!("request to {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let link = header_str(headers, LINK).map(String::from);
        let retry_after = header_str(headers, RETRY_AFTER).and_then(|v| v.trim().parse().ok());
        let rate_limit_remaining =
            header_str(headers, "x-ratelimit-remaining").and_then(|v| v.trim().parse().ok());
        let rate_limit_reset =
            header_str(headers, "x-ratelimit-reset").and_then(|v| v.trim().parse().ok());

        let body = response
            .text()
            .map_err(|e| TrendsError::Http(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            body,
            link,
            retry_after,
            rate_limit_remaining,
            rate_limit_reset,
        })
    }
}
