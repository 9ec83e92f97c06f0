//! Services for fetching, bucketing and aggregating activity

pub mod aggregator;
pub mod bucketer;
pub mod fetcher;
pub mod identity;
pub mod rate_limit;
pub mod sink;
pub mod trend_service;
pub mod window_planner;

pub use aggregator::Aggregator;
pub use bucketer::TimeBucketer;
pub use fetcher::{FetchConfig, FetchedPages, PaginatedFetcher};
pub use identity::IdentityResolver;
pub use rate_limit::{RateLimitGuard, RateLimitPolicy};
pub use sink::{render, FileSink, OutputFormat, Sink, StdoutSink};
pub use trend_service::{MetricRequest, RunStats, TrendConfig, TrendService};
pub use window_planner::WindowPlanner;
