/// What `EXPLAIN QUERY PLAN` told us about a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanInfo {
    pub index_used: Option<String>,
    pub rows_scanned: u64,
}

pub const UNKNOWN_INDEX: &str = "Unable to determine";
pub const TABLE_SCAN: &str = "No index used (table scan)";

impl PlanInfo {
    /// Placeholder recorded when the plan probe itself fails.
    pub fn unknown() -> Self {
        Self {
            index_used: Some(UNKNOWN_INDEX.to_string()),
            rows_scanned: 0,
        }
    }
}

/// Pull the index name and the estimated row count out of plan lines.
///
/// Later lines win, matching the order SQLite reports nested loops in.
pub fn parse_plan<I, S>(lines: I) -> PlanInfo
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index_used = None;
    let mut rows_scanned = 0;
    for line in lines {
        let line = line.as_ref();
        if let Some(name) = index_after(line, "USING COVERING INDEX")
            .or_else(|| index_after(line, "USING INDEX"))
        {
            index_used = Some(name);
        } else if line.contains("SCAN TABLE") {
            index_used = Some(TABLE_SCAN.to_string());
        }
        if line.contains("SCAN") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if let Some(pos) = parts.iter().position(|part| *part == "~") {
                if let Some(count) = parts.get(pos + 1).and_then(|raw| raw.parse().ok()) {
                    rows_scanned = count;
                }
            }
        }
    }
    PlanInfo {
        index_used,
        rows_scanned,
    }
}

fn index_after(line: &str, marker: &str) -> Option<String> {
    let (_, rest) = line.rsplit_once(marker)?;
    rest.split_whitespace().next().map(|name| name.to_string())
}
