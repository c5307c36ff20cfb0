use crate::db::{Db, as_f64, as_i64};
use crate::error::GndError;
use crate::model::{Stats, UniRefPresence};
use crate::request::Request;
use crate::schema::SchemaProfile;
use anyhow::Result;
use rusqlite::types::Value as SqlValue;

/// Job-level summary returned when no range is requested.
pub fn summarize(db: &mut Db, profile: SchemaProfile, request: &Request, query: &str) -> Result<Stats> {
    let (start_index, end_index) = index_bounds(db, profile, request, query)?;
    let max_index = end_index - start_index;
    let num_checked = max_index + 1;

    let min_bp = real_scalar(db, "SELECT MIN(rel_start) FROM neighbors LIMIT 1", "neighbors.rel_start")?;
    let max_bp = real_scalar(db, "SELECT MAX(rel_stop) FROM neighbors LIMIT 1", "neighbors.rel_stop")?;
    let query_width = real_scalar(
        db,
        "SELECT MAX(abs(rel_stop - rel_start)) AS max_diff FROM attributes",
        "attributes span",
    )?;
    let actual_max_width = if max_bp.abs() > min_bp.abs() {
        max_bp.abs()
    } else {
        min_bp.abs() * 2.0 + query_width
    };

    let fetched = int_scalar(db, "SELECT COUNT(*) FROM attributes", "attributes count")?
        + int_scalar(db, "SELECT COUNT(*) FROM neighbors", "neighbors count")?;

    Ok(Stats {
        max_index,
        scale_factor: request.scale_factor,
        legend_scale: max_bp - min_bp,
        min_bp,
        max_bp,
        query_width,
        actual_max_width,
        time_data: time_data(num_checked, fetched),
        num_checked,
        index_range: vec![[start_index, end_index]],
        has_uniref: uniref_presence(db)?,
    })
}

/// `(start_index, end_index)` of the cluster named by `query`, or of the
/// UniRef cluster being expanded.
fn index_bounds(
    db: &mut Db,
    profile: SchemaProfile,
    request: &Request,
    query: &str,
) -> Result<(i64, i64)> {
    let (sql, param, what) = match &request.uniref_id {
        None => {
            let table = profile.cluster_index_table();
            (
                format!("SELECT start_index, end_index FROM {table} WHERE cluster_num = ? LIMIT 1"),
                query.to_string(),
                format!("{table} for cluster {query}"),
            )
        }
        Some(uniref_id) => {
            let table = profile.range_table()?;
            (
                format!("SELECT start_index, end_index FROM {table} WHERE uniref_id = ? LIMIT 1"),
                uniref_id.clone(),
                format!("{table} for {uniref_id}"),
            )
        }
    };
    let rows = db.execute(&sql, &[SqlValue::Text(param)])?;
    let row = rows.first().ok_or_else(|| GndError::missing_row(what.clone()))?;
    let start = row.first().and_then(as_i64);
    let end = row.get(1).and_then(as_i64);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(GndError::missing_row(what).into()),
    }
}

fn uniref_presence(db: &mut Db) -> Result<UniRefPresence> {
    Ok(if db.table_exists("uniref50_index")? {
        UniRefPresence::UniRef50
    } else if db.table_exists("uniref90_index")? {
        UniRefPresence::UniRef90
    } else {
        UniRefPresence::Absent
    })
}

fn real_scalar(db: &mut Db, sql: &str, what: &str) -> Result<f64> {
    let value = db.scalar(sql, &[], what)?;
    as_f64(&value).ok_or_else(|| GndError::missing_row(what).into())
}

fn int_scalar(db: &mut Db, sql: &str, what: &str) -> Result<i64> {
    let value = db.scalar(sql, &[], what)?;
    as_i64(&value).ok_or_else(|| GndError::missing_row(what).into())
}

/// Diagnostic line the front end shows under the diagrams.
pub fn time_data(num_checked: i64, fetched: i64) -> String {
    format!(
        "#Ids: {num_checked}, #Queries: {}, QueryTime: 0, #Fetch: {fetched}, FetchTime: 0, Total: 0 PROC=0 PARSE=0",
        num_checked * 2
    )
}
