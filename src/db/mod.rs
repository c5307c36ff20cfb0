use crate::audit::{AuditLog, AuditRecord};
use crate::config::Config;
use crate::error::GndError;
use anyhow::{Context, Result};
use blake3::Hasher;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, params_from_iter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

pub mod plan;

use plan::{PlanInfo, parse_plan};

pub type Row = Vec<SqlValue>;

/// Shared, immutable result set. Cache hits hand out another handle to the same rows.
pub type Rows = Rc<[Row]>;

/// Read-only handle on one job store.
///
/// Owns the connection, the result cache and the audit log for a single
/// request; all three are released when the handle is dropped.
pub struct Db {
    db_path: PathBuf,
    conn: Connection,
    cache: HashMap<String, Rows>,
    audit: Option<AuditLog>,
    round_trips: usize,
    slow_query: Duration,
}

impl Db {
    /// Open `db_path` read-only. When `audit_path` is given the audit log is
    /// truncated and its header written before any query runs.
    pub fn open(db_path: &Path, audit_path: Option<&Path>) -> Result<Self> {
        let audit = audit_path.map(AuditLog::create).transpose()?;
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open sqlite db at {}", db_path.display()))?;
        debug!(db = %db_path.display(), "opened job store");

        Ok(Self {
            db_path: db_path.to_path_buf(),
            conn,
            cache: HashMap::new(),
            audit,
            round_trips: 0,
            slow_query: Duration::from_millis(Config::get().slow_query_ms),
        })
    }

    /// Number of statements that actually reached the store.
    pub fn store_round_trips(&self) -> usize {
        self.round_trips
    }

    /// Run a read query, serving repeats of the same `(query, params)` from cache.
    pub fn execute(&mut self, query: &str, params: &[SqlValue]) -> Result<Rows> {
        let rendered = render_params(params);
        let key = cache_key(query, &rendered);
        if let Some(rows) = self.cache.get(&key) {
            trace!(query = %compact(query), "cache hit");
            return Ok(Rc::clone(rows));
        }

        let started = Instant::now();
        let plan = self.probe_plan(query, params).unwrap_or_else(|err| {
            debug!(query = %compact(query), %err, "query plan unavailable");
            PlanInfo::unknown()
        });
        let rows: Rows = self.run(query, params)?.into();
        let elapsed = started.elapsed();
        self.round_trips += 1;

        if elapsed > self.slow_query {
            warn!(
                db = %self.db_path.display(),
                query = %compact(query),
                params = %rendered,
                ?elapsed,
                "slow query"
            );
        } else {
            debug!(query = %compact(query), params = %rendered, rows = rows.len(), ?elapsed, "query");
        }

        if let Some(audit) = self.audit.as_mut() {
            audit.append(&AuditRecord {
                query,
                params: &rendered,
                exec_time: elapsed,
                rows_returned: rows.len(),
                rows_scanned: plan.rows_scanned,
                index_used: plan.index_used.as_deref(),
            })?;
        }

        self.cache.insert(key, Rc::clone(&rows));
        Ok(rows)
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        let rows = self.execute(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?",
            &[SqlValue::Text(table.to_string())],
        )?;
        Ok(!rows.is_empty())
    }

    pub fn column_exists(&mut self, column: &str, table: &str) -> Result<bool> {
        let rows = self.execute(&format!("PRAGMA table_info({table})"), &[])?;
        Ok(rows
            .iter()
            .any(|row| row.get(1).and_then(as_text).as_deref() == Some(column)))
    }

    /// First column of the first row, or a missing-row error naming `what`.
    pub fn scalar(&mut self, query: &str, params: &[SqlValue], what: &str) -> Result<SqlValue> {
        let rows = self.execute(query, params)?;
        rows.first()
            .and_then(|row| row.first())
            .cloned()
            .ok_or_else(|| GndError::missing_row(what).into())
    }

    fn run(&self, query: &str, params: &[SqlValue]) -> rusqlite::Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(query)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|idx| row.get::<_, SqlValue>(idx))
                .collect::<rusqlite::Result<Row>>()
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn probe_plan(&self, query: &str, params: &[SqlValue]) -> rusqlite::Result<PlanInfo> {
        let mut stmt = self.conn.prepare(&format!("EXPLAIN QUERY PLAN {query}"))?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut parts = Vec::with_capacity(width);
            for idx in 0..width {
                parts.push(display_value(&row.get::<_, SqlValue>(idx)?));
            }
            Ok(parts.join(" "))
        })?;
        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(parse_plan(lines))
    }
}

fn cache_key(query: &str, rendered_params: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(query.as_bytes());
    hasher.update(b"\n");
    hasher.update(rendered_params.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn compact(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parameter tuple as it appears in the audit log, e.g. `(5,)` or `('UniRef90_X', 2)`.
pub fn render_params(params: &[SqlValue]) -> String {
    if params.is_empty() {
        return "None".to_string();
    }
    let parts: Vec<String> = params.iter().map(repr_value).collect();
    if parts.len() == 1 {
        format!("({},)", parts[0])
    } else {
        format!("({})", parts.join(", "))
    }
}

fn repr_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(text) => format!("'{text}'"),
        other => display_value(other),
    }
}

fn display_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "None".to_string(),
        SqlValue::Integer(v) => v.to_string(),
        SqlValue::Real(v) => format!("{v:?}"),
        SqlValue::Text(text) => text.clone(),
        SqlValue::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

pub fn as_i64(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Integer(v) => Some(*v),
        SqlValue::Real(v) => Some(*v as i64),
        SqlValue::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_f64(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Integer(v) => Some(*v as f64),
        SqlValue::Real(v) => Some(*v),
        SqlValue::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => None,
        other => Some(display_value(other)),
    }
}
