//! `ghtrends export` subcommand: one metric, one series (or one per label)

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;

use super::CommonArgs;
use crate::github::{slugify_label, Transport};
use crate::services::{FileSink, MetricRequest, OutputFormat, Sink, StdoutSink, TrendService};
use crate::types::{BucketCount, Granularity, MetricKind, Result};

/// Export one metric
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Metric to aggregate
    #[arg(long, value_enum, default_value_t = MetricKind::PrsOpened)]
    pub metric: MetricKind,

    /// Bucket size (default: weekly, monthly for releases)
    #[arg(long, value_enum)]
    pub bucket: Option<Granularity>,

    /// Restrict issue/PR metrics to a label (repeat for one series per label)
    #[arg(long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Output file (stdout if omitted); a directory when several labels are given
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl ExportArgs {
    pub fn run(self, today: NaiveDate) -> Result<()> {
        let service = self.common.service(today)?;
        self.execute(&service)
    }

    pub fn granularity(&self) -> Granularity {
        self.bucket.unwrap_or(self.metric.default_granularity())
    }

    pub fn execute<T: Transport>(&self, service: &TrendService<T>) -> Result<()> {
        let granularity = self.granularity();

        match self.labels.as_slice() {
            [] | [_] => {
                let mut request = MetricRequest::new(self.metric).with_granularity(granularity);
                if let Some(label) = self.labels.first() {
                    request = request.with_label(label.clone());
                }
                let rows = service.collect(&request)?;
                self.write(self.out.as_deref(), &rows)
            }
            labels => {
                // All series are computed before any file is written
                let series = service.collect_per_label(self.metric, labels, granularity)?;
                let dir = self.out.clone().unwrap_or_else(|| PathBuf::from("."));
                for (label, rows) in &series {
                    let path = dir.join(self.label_file_name(label));
                    self.write(Some(&path), rows)?;
                }
                Ok(())
            }
        }
    }

    /// `issues_opened_label-major-decision-pending_weekly.csv`
    pub fn label_file_name(&self, label: &str) -> String {
        format!(
            "{}_label-{}_{}.{}",
            self.metric.file_stem(),
            slugify_label(label),
            self.granularity().suffix(),
            self.format.extension()
        )
    }

    fn write(&self, path: Option<&Path>, rows: &[BucketCount]) -> Result<()> {
        match path {
            Some(path) => FileSink::new(path, self.format).write(rows),
            None => StdoutSink::new(self.format).write(rows),
        }
    }
}
