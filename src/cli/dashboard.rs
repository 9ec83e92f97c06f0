//! `ghtrends dashboard` subcommand: the full CSV set for one repository

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;

use super::CommonArgs;
use crate::github::{slugify_label, Transport};
use crate::services::{FileSink, MetricRequest, OutputFormat, Sink, TrendService};
use crate::types::{BucketCount, MetricKind, Result};

/// Label exported when --labels is not given
pub const DEFAULT_LABEL: &str = "enhancement";

/// Write every dashboard series as CSV
#[derive(Args, Debug)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory for the CSV files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Comma-separated exact label names to export opened/closed issue series for
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_LABEL)]
    pub labels: Vec<String>,
}

/// One output file and the series that fills it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSeries {
    pub file_name: String,
    pub request: MetricRequest,
}

impl DashboardArgs {
    pub fn run(self, today: NaiveDate) -> Result<()> {
        let service = self.common.service(today)?;
        self.execute(&service)
    }

    /// Files in write order
    pub fn plan(&self) -> Vec<DashboardSeries> {
        let series = |file_name: String, request: MetricRequest| DashboardSeries { file_name, request };
        let file = |kind: MetricKind| format!("{}_{}.csv", kind.file_stem(), kind.default_granularity().suffix());

        let mut plan: Vec<DashboardSeries> = [
            MetricKind::PrsOpened,
            MetricKind::PrsClosed,
            MetricKind::PrsMerged,
            MetricKind::IssuesOpened,
            MetricKind::IssuesClosed,
        ]
        .into_iter()
        .map(|kind| series(file(kind), MetricRequest::new(kind)))
        .collect();

        for label in self.label_names() {
            let slug = slugify_label(&label);
            for (kind, which) in [(MetricKind::IssuesOpened, "opened"), (MetricKind::IssuesClosed, "closed")] {
                plan.push(series(
                    format!("label-{}_{}_weekly.csv", slug, which),
                    MetricRequest::new(kind).with_label(label.clone()),
                ));
            }
        }

        for kind in [MetricKind::Commits, MetricKind::Contributors, MetricKind::Releases] {
            plan.push(series(file(kind), MetricRequest::new(kind)));
        }
        plan
    }

    /// Trimmed, non-empty labels; `enhancement` when none are left
    fn label_names(&self) -> Vec<String> {
        let labels: Vec<String> = self
            .labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if labels.is_empty() {
            vec![DEFAULT_LABEL.to_string()]
        } else {
            labels
        }
    }

    pub fn execute<T: Transport>(&self, service: &TrendService<T>) -> Result<()> {
        let plan = self.plan();

        let mut results: Vec<Vec<BucketCount>> = vec![Vec::new(); plan.len()];
        for group in fetch_groups(&plan) {
            let requests: Vec<MetricRequest> = group.iter().map(|&i| plan[i].request.clone()).collect();
            for (&i, (rows, _)) in group.iter().zip(service.collect_shared(&requests)?) {
                results[i] = rows;
            }
        }

        for (series, rows) in plan.iter().zip(&results) {
            FileSink::new(self.out_dir.join(&series.file_name), OutputFormat::Csv).write(rows)?;
        }
        log::info!("Wrote {} files to {}", plan.len(), self.out_dir.display());
        Ok(())
    }
}

/// Plan indices grouped by the record stream they read, in first-seen order
fn fetch_groups(plan: &[DashboardSeries]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, series) in plan.iter().enumerate() {
        let shared = groups.iter_mut().find(|group| {
            group
                .first()
                .is_some_and(|&j| shares_fetch(&plan[j].request, &series.request))
        });
        match shared {
            Some(group) => group.push(i),
            None => groups.push(vec![i]),
        }
    }
    groups
}

fn shares_fetch(a: &MetricRequest, b: &MetricRequest) -> bool {
    a.kind.collection() == b.kind.collection() && a.label == b.label
}
