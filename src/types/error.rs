use chrono::NaiveDate;
use thiserror::Error;

/// ghtrends error types
#[derive(Error, Debug)]
pub enum TrendsError {
    /// Window start falls after its end
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Non-success, non-rate-limit response from the remote API
    #[error("remote API error {status} for query `{query}` page {page}: {body}")]
    RemoteApi {
        status: u16,
        query: String,
        page: u32,
        body: String,
    },

    /// Rate limit persisted past the configured retry budget
    #[error("rate limit not lifted after {retries} retries for query `{query}` page {page}")]
    RateLimitExhausted {
        query: String,
        page: u32,
        retries: u32,
    },

    /// Timestamp did not match the expected wire format
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Record carries no usable contributor identity
    #[error("record has no contributor identity")]
    MissingIdentity,

    /// Transport-level HTTP failure (connect, timeout, TLS)
    #[error("http error: {0}")]
    Http(String),

    /// Failed to parse a response body
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl TrendsError {
    /// Per-record defects are skipped; everything else aborts the run.
    pub fn is_record_defect(&self) -> bool {
        matches!(
            self,
            TrendsError::MalformedTimestamp(_) | TrendsError::MissingIdentity
        )
    }
}

/// Result type alias for ghtrends
pub type Result<T> = std::result::Result<T, TrendsError>;
