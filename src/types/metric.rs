//! Metric kinds and the pipeline choices they drive

use super::Granularity;

/// Activity series that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum MetricKind {
    PrsOpened,
    PrsClosed,
    PrsMerged,
    IssuesOpened,
    IssuesClosed,
    Commits,
    Contributors,
    Releases,
}

/// Remote collection a metric reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Search(SearchEntity, SearchState),
    Commits,
    Releases,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEntity {
    PullRequest,
    Issue,
}

/// Which lifecycle date the search range is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Opened,
    Closed,
    Merged,
}

/// Record field holding the event time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    Created,
    Closed,
    Merged,
    Authored,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationMode {
    /// One per event
    Count,
    /// Distinct contributors per bucket
    Unique,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::PrsOpened,
        MetricKind::PrsClosed,
        MetricKind::PrsMerged,
        MetricKind::IssuesOpened,
        MetricKind::IssuesClosed,
        MetricKind::Commits,
        MetricKind::Contributors,
        MetricKind::Releases,
    ];

    pub fn collection(&self) -> Collection {
        use SearchEntity::{Issue, PullRequest};
        use SearchState::{Closed, Merged, Opened};
        match self {
            MetricKind::PrsOpened => Collection::Search(PullRequest, Opened),
            MetricKind::PrsClosed => Collection::Search(PullRequest, Closed),
            MetricKind::PrsMerged => Collection::Search(PullRequest, Merged),
            MetricKind::IssuesOpened => Collection::Search(Issue, Opened),
            MetricKind::IssuesClosed => Collection::Search(Issue, Closed),
            MetricKind::Commits | MetricKind::Contributors => Collection::Commits,
            MetricKind::Releases => Collection::Releases,
        }
    }

    pub fn timestamp_field(&self) -> TimestampField {
        match self.collection() {
            Collection::Search(_, SearchState::Opened) => TimestampField::Created,
            Collection::Search(_, SearchState::Closed) => TimestampField::Closed,
            Collection::Search(_, SearchState::Merged) => TimestampField::Merged,
            Collection::Commits => TimestampField::Authored,
            Collection::Releases => TimestampField::Published,
        }
    }

    pub fn mode(&self) -> AccumulationMode {
        match self {
            MetricKind::Contributors => AccumulationMode::Unique,
            _ => AccumulationMode::Count,
        }
    }

    pub fn default_granularity(&self) -> Granularity {
        match self {
            MetricKind::Releases => Granularity::Monthly,
            _ => Granularity::Weekly,
        }
    }

    /// Whether a label qualifier can be attached to the query
    pub fn supports_labels(&self) -> bool {
        matches!(self.collection(), Collection::Search(..))
    }

    /// File stem used by the dashboard export (`prs_opened`, `commits`, ...)
    pub fn file_stem(&self) -> &'static str {
        match self {
            MetricKind::PrsOpened => "prs_opened",
            MetricKind::PrsClosed => "prs_closed",
            MetricKind::PrsMerged => "prs_merged",
            MetricKind::IssuesOpened => "issues_opened",
            MetricKind::IssuesClosed => "issues_closed",
            MetricKind::Commits => "commits",
            MetricKind::Contributors => "contributors",
            MetricKind::Releases => "releases",
        }
    }
}
