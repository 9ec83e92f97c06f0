//! Output sinks for finalized `(time, count)` rows

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::types::{BucketCount, Result, TrendsError};

/// CSV header consumed by dashboard data sources
pub const CSV_HEADER: &str = "time,count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Destination for rows already sorted ascending by time
pub trait Sink {
    fn write(&mut self, rows: &[BucketCount]) -> Result<()>;
}

/// Render rows in `format`
pub fn render(rows: &[BucketCount], format: OutputFormat) -> Result<String> {
    debug_assert!(
        rows.windows(2).all(|w| w[0].time < w[1].time),
        "rows must be strictly ascending"
    );
    match format {
        OutputFormat::Csv => {
            let mut out = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 24);
            out.push_str(CSV_HEADER);
            out.push('\n');
            for row in rows {
                out.push_str(&format!("{},{}\n", row.time, row.count));
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(rows)
                .map_err(|e| TrendsError::Parse(format!("Serialization failed: {}", e)))?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Writes to a file via temp file + rename, so a failed run leaves any
/// existing file untouched
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&mut self, rows: &[BucketCount]) -> Result<()> {
        let content = render(rows, self.format)?;
        write_atomic(&self.path, content.as_bytes())?;
        log::info!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Writes rows to stdout
pub struct StdoutSink {
    format: OutputFormat,
}

impl StdoutSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Sink for StdoutSink {
    fn write(&mut self, rows: &[BucketCount]) -> Result<()> {
        let content = render(rows, self.format)?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(content.as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}

/// Atomic replace with an exclusive lock held on the target during rename
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path
        .file_name()
        .ok_or_else(|| TrendsError::Config(format!("not a file path: {}", path.display())))?
        .to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let file = File::create(&temp_path)?;
    let replaced = replace_from_temp(file, &temp_path, path, content);
    if replaced.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    replaced
}

/// Fill the temp file, then rename it over `path` under an exclusive lock
fn replace_from_temp(mut file: File, temp_path: &Path, path: &Path, content: &[u8]) -> Result<()> {
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);

    let target = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    target.lock_exclusive()?;

    let renamed = fs::rename(temp_path, path);
    let _ = target.unlock();
    renamed.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TimeBucketer;
    use crate::types::Granularity;
    use tempfile::TempDir;

    fn row(raw: &str, count: u64) -> BucketCount {
        BucketCount {
            time: TimeBucketer::bucket_str(raw, Granularity::Weekly).unwrap(),
            count,
        }
    }

    fn sample() -> Vec<BucketCount> {
        vec![row("2024-01-01T10:00:00Z", 2), row("2024-01-08T10:00:00Z", 1)]
    }

    // ========== render tests ==========

    #[test]
    fn test_render_csv() {
        let csv = render(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "time,count\n2024-01-01T00:00:00Z,2\n2024-01-08T00:00:00Z,1\n"
        );
    }

    #[test]
    fn test_render_csv_empty_has_header_only() {
        assert_eq!(render(&[], OutputFormat::Csv).unwrap(), "time,count\n");
    }

    #[test]
    fn test_render_json() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["time"], "2024-01-01T00:00:00Z");
        assert_eq!(parsed[0]["count"], 2);
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    // ========== FileSink tests ==========

    #[test]
    fn test_file_sink_writes_and_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("prs_opened_weekly.csv");

        let mut sink = FileSink::new(&path, OutputFormat::Csv);
        sink.write(&sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("time,count\n"));
        assert_eq!(content.lines().count(), 3);
        assert!(!temp.path().join("data").join("prs_opened_weekly.csv.tmp").exists());
    }

    #[test]
    fn test_file_sink_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        fs::write(&path, "stale contents that are much longer than the new file\n").unwrap();

        FileSink::new(&path, OutputFormat::Csv).write(&[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "time,count\n");
    }

    #[test]
    fn test_file_sink_unwritable_destination_is_io_error() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is expected
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let path = blocker.join("out.csv");

        let err = FileSink::new(&path, OutputFormat::Csv)
            .write(&sample())
            .unwrap_err();
        assert!(matches!(err, TrendsError::Io(_)));
    }

    // ========== temp file cleanup ==========

    #[test]
    fn test_file_sink_removes_temp_when_target_cannot_open() {
        let temp = TempDir::new().unwrap();
        // Temp file is creatable next to it, but the target itself is a directory
        let path = temp.path().join("out.csv");
        fs::create_dir(&path).unwrap();

        let err = FileSink::new(&path, OutputFormat::Csv)
            .write(&sample())
            .unwrap_err();

        assert!(matches!(err, TrendsError::Io(_)));
        assert!(!temp.path().join("out.csv.tmp").exists());
        assert!(path.is_dir());
    }
}
