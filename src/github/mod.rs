//! GitHub REST API adapter: record shapes, query builders and transport

#[cfg(test)]
pub(crate) mod mock;
mod query;
mod records;
mod transport;

pub use query::{build_search_query, quote_label, slugify_label, Query};
pub use records::{AccountRef, CommitDetail, EventRecord, GitSignature, PullRequestRef};
pub use transport::{parse_next_link, HttpRequest, HttpResponse, HttpTransport, Transport};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";
