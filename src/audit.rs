use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

pub const HEADER: [&str; 8] = [
    "Timestamp",
    "Query",
    "Params",
    "Time",
    "Rows Returned",
    "Rows Scanned",
    "Scan Ratio",
    "Index Used",
];

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// One executed (non-cached) query.
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub query: &'a str,
    pub params: &'a str,
    pub exec_time: Duration,
    pub rows_returned: usize,
    pub rows_scanned: u64,
    pub index_used: Option<&'a str>,
}

/// Append-only CSV log of query performance, truncated when opened.
pub struct AuditLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl AuditLog {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .from_path(path)
            .with_context(|| format!("create audit log {}", path.display()))?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn append(&mut self, record: &AuditRecord<'_>) -> Result<()> {
        let ratio = scan_ratio(record.rows_scanned, record.rows_returned);
        self.writer.write_record([
            timestamp()?,
            record.query.to_string(),
            record.params.to_string(),
            format!("{:.4}", record.exec_time.as_secs_f64()),
            record.rows_returned.to_string(),
            record.rows_scanned.to_string(),
            format!("{ratio:.2}"),
            record.index_used.unwrap_or("None").to_string(),
        ])?;
        self.writer
            .flush()
            .with_context(|| format!("flush audit log {}", self.path.display()))?;
        Ok(())
    }
}

/// Rows scanned per row returned; infinite when nothing came back.
pub fn scan_ratio(rows_scanned: u64, rows_returned: usize) -> f64 {
    if rows_returned == 0 {
        f64::INFINITY
    } else {
        rows_scanned as f64 / rows_returned as f64
    }
}

fn timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(now.format(TIMESTAMP_FORMAT)?)
}
