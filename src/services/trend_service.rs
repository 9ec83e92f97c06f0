//! Trend pipeline: plan → fetch → bucket → aggregate
//!
//! One parameterized pipeline serves every metric kind; the kind decides
//! which collection is queried, which timestamp is read and whether
//! events are counted or contributors deduplicated.

use crate::github::{EventRecord, HttpTransport, Query, Transport};
use crate::services::{Aggregator, IdentityResolver, PaginatedFetcher, TimeBucketer, WindowPlanner};
use crate::types::{
    BucketCount, Collection, DateWindow, Granularity, MetricKind, RepoId, Result, TimestampField,
    TrendsError,
};

/// Scope of one run
#[derive(Debug, Clone)]
pub struct TrendConfig {
    pub repo: RepoId,
    pub window: DateWindow,
    pub chunk_days: u32,
    pub exclude_bots: bool,
}

/// One series to compute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRequest {
    pub kind: MetricKind,
    pub label: Option<String>,
    pub granularity: Granularity,
}

impl MetricRequest {
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            label: None,
            granularity: kind.default_granularity(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// Per-run record accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub fetched: u64,
    pub counted: u64,
    pub outside_window: u64,
    pub missing_timestamp: u64,
    pub malformed_timestamp: u64,
    pub missing_identity: u64,
    /// Queries whose search reported `incomplete_results`
    pub incomplete_queries: u64,
}

impl RunStats {
    pub fn skipped(&self) -> u64 {
        self.outside_window + self.missing_timestamp + self.malformed_timestamp + self.missing_identity
    }
}

pub struct TrendService<T: Transport = HttpTransport> {
    fetcher: PaginatedFetcher<T>,
    config: TrendConfig,
    resolver: IdentityResolver,
}

impl<T: Transport> TrendService<T> {
    pub fn new(fetcher: PaginatedFetcher<T>, config: TrendConfig) -> Self {
        let resolver = IdentityResolver::new(config.exclude_bots);
        Self {
            fetcher,
            config,
            resolver,
        }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &PaginatedFetcher<T> {
        &self.fetcher
    }

    /// Sorted `(bucket, count)` rows for `request`
    pub fn collect(&self, request: &MetricRequest) -> Result<Vec<BucketCount>> {
        self.collect_with_stats(request).map(|(rows, _)| rows)
    }

    pub fn collect_with_stats(&self, request: &MetricRequest) -> Result<(Vec<BucketCount>, RunStats)> {
        self.collect_shared(std::slice::from_ref(request))?
            .pop()
            .ok_or_else(|| TrendsError::Config("no series requested".into()))
    }

    /// Several series fed from one fetch of their shared record stream.
    ///
    /// Every request must map to the same queries (e.g. commit counts and
    /// contributors); rows come back in request order.
    pub fn collect_shared(&self, requests: &[MetricRequest]) -> Result<Vec<(Vec<BucketCount>, RunStats)>> {
        let Some(first) = requests.first() else {
            return Ok(Vec::new());
        };
        let queries = self.queries(first)?;
        for other in &requests[1..] {
            if self.queries(other)? != queries {
                return Err(TrendsError::Config(format!(
                    "{:?} and {:?} cannot share one fetch",
                    first.kind, other.kind
                )));
            }
        }

        let name = requests
            .iter()
            .map(|r| format!("{:?}", r.kind))
            .collect::<Vec<_>>()
            .join("+");
        let name = match first.label.as_deref() {
            Some(label) => format!("{} [{}]", name, label),
            None => name,
        };

        let mut tables: Vec<(Aggregator, RunStats)> = requests
            .iter()
            .map(|r| (Aggregator::new(r.kind.mode()), RunStats::default()))
            .collect();

        for (i, query) in queries.iter().enumerate() {
            log::info!("{}: query {}/{} `{}`", name, i + 1, queries.len(), query);
            let fetched = self.fetcher.fetch(query)?;
            for (request, (aggregator, stats)) in requests.iter().zip(tables.iter_mut()) {
                if fetched.incomplete {
                    stats.incomplete_queries += 1;
                }
                let field = request.kind.timestamp_field();
                for record in &fetched.records {
                    stats.fetched += 1;
                    self.ingest(record, field, request.granularity, aggregator, stats)?;
                }
            }
        }

        Ok(requests
            .iter()
            .zip(tables)
            .map(|(request, (aggregator, stats))| {
                log::info!(
                    "{:?}: {} records fetched, {} counted, {} skipped, {} buckets",
                    request.kind,
                    stats.fetched,
                    stats.counted,
                    stats.skipped(),
                    aggregator.len()
                );
                if stats.incomplete_queries > 0 {
                    log::warn!(
                        "{:?}: {} of {} queries returned incomplete search results",
                        request.kind,
                        stats.incomplete_queries,
                        queries.len()
                    );
                }
                (aggregator.finalize(), stats)
            })
            .collect())
    }

    /// One independent aggregation per label
    pub fn collect_per_label(
        &self,
        kind: MetricKind,
        labels: &[String],
        granularity: Granularity,
    ) -> Result<Vec<(String, Vec<BucketCount>)>> {
        labels
            .iter()
            .map(|label| {
                let request = MetricRequest::new(kind)
                    .with_label(label.clone())
                    .with_granularity(granularity);
                self.collect(&request).map(|rows| (label.clone(), rows))
            })
            .collect()
    }

    /// Queries for `request`: one per chunk, except releases (listed once)
    fn queries(&self, request: &MetricRequest) -> Result<Vec<Query>> {
        let kind = request.kind;
        if request.label.is_some() && !kind.supports_labels() {
            return Err(TrendsError::Config(format!(
                "label filters only apply to issue and pull request metrics, not {:?}",
                kind
            )));
        }

        let repo = &self.config.repo;
        match kind.collection() {
            Collection::Search(entity, state) => {
                let chunks = WindowPlanner::plan(&self.config.window, self.config.chunk_days)?;
                Ok(chunks
                    .iter()
                    .map(|chunk| Query::search(repo, entity, state, request.label.as_deref(), chunk))
                    .collect())
            }
            Collection::Commits => {
                let chunks = WindowPlanner::plan(&self.config.window, self.config.chunk_days)?;
                Ok(chunks.iter().map(|chunk| Query::commits(repo, chunk)).collect())
            }
            Collection::Releases => Ok(vec![Query::releases(repo)]),
        }
    }

    /// Fold one record into the table; per-record defects are counted and skipped
    fn ingest(
        &self,
        record: &EventRecord,
        field: TimestampField,
        granularity: Granularity,
        aggregator: &mut Aggregator,
        stats: &mut RunStats,
    ) -> Result<()> {
        let Some(raw) = record.timestamp(field) else {
            stats.missing_timestamp += 1;
            log::debug!("Skipping record without {:?} timestamp", field);
            return Ok(());
        };

        let timestamp = match TimeBucketer::parse_timestamp(raw) {
            Ok(ts) => ts,
            Err(e) => {
                stats.malformed_timestamp += 1;
                log::debug!("Skipping record: {}", e);
                return Ok(());
            }
        };

        if !self.config.window.contains(timestamp.date_naive()) {
            stats.outside_window += 1;
            return Ok(());
        }

        let key = TimeBucketer::bucket(&timestamp, granularity);
        match aggregator.add(key, self.resolver.resolve(record)) {
            Ok(()) => stats.counted += 1,
            Err(e) if e.is_record_defect() => {
                stats.missing_identity += 1;
                log::debug!("Skipping record at {}: {}", raw, e);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}
