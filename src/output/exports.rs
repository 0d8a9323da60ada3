use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, TravisDumpError};
use crate::providers::travis::Build;

/// Column names of the exported CSV, in output order.
pub const CSV_HEADERS: [&str; 12] = [
    "ID",
    "Number",
    "State",
    "EventType",
    "RepositoryName",
    "BranchName",
    "PullRequestTitle",
    "StartedAt",
    "FinishedAt",
    "Duration",
    "CreatedByID",
    "CreatedByLogin",
];

/// Destination for builds drained from the provider.
pub trait BuildSink {
    /// Append builds in the order given.
    fn write_builds(&mut self, builds: &[Build]) -> Result<()>;
}

/// Writes one CSV row per build.
///
/// The header row is written on construction, so an export that drains no
/// builds still produces a valid header-only file. Rows are buffered and only
/// guaranteed to reach the destination after [`CsvExporter::finish`].
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvExporter<File> {
    /// Create (or truncate) the CSV file at `path` and write the header.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvExporter<W> {
    pub fn from_writer(output: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(CSV_HEADERS)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Number of data rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush buffered rows and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| TravisDumpError::Io(e.into_error()))
    }
}

impl<W: Write> BuildSink for CsvExporter<W> {
    fn write_builds(&mut self, builds: &[Build]) -> Result<()> {
        for build in builds {
            self.writer.write_record(build_record(build))?;
            self.rows += 1;
        }
        Ok(())
    }
}

/// Project a build onto the exported columns.
pub fn build_record(build: &Build) -> [String; 12] {
    let (created_by_id, created_by_login) = build
        .created_by
        .as_ref()
        .map(|user| (user.id.to_string(), user.login.clone()))
        .unwrap_or_default();

    [
        build.id.to_string(),
        build.number.clone(),
        build.state.clone(),
        build.event_type.clone(),
        build.repository.name.clone(),
        build.branch.name.clone(),
        build.pull_request_title.clone().unwrap_or_default(),
        format_timestamp(build.started_at.as_ref()),
        format_timestamp(build.finished_at.as_ref()),
        build
            .duration
            .map(|duration| duration.to_string())
            .unwrap_or_default(),
        created_by_id,
        created_by_login,
    ]
}

/// RFC 3339 with whole seconds, keeping the original offset (`Z` for UTC).
fn format_timestamp(timestamp: Option<&DateTime<FixedOffset>>) -> String {
    timestamp
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
