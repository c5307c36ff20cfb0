use crate::db::{Db, Row, as_f64, as_i64, as_text};
use crate::error::GndError;
use crate::family::FamilyValues;
use crate::job::JobClass;
use crate::model::{Attributes, DiagramElement, Neighbor, StoreValue};
use crate::request::Request;
use crate::schema::SchemaProfile;
use anyhow::Result;
use rusqlite::types::Value as SqlValue;
use tracing::debug;

const ATTRIBUTE_COLUMNS: &str = "accession, id, num, family, ipro_family, start, stop, \
     rel_start, rel_stop, strain, direction, type, seq_len, organism, taxon_id, \
     anno_status, desc, family_desc, ipro_family_desc, color, sort_order, is_bound";

const NEIGHBOR_QUERY: &str = "SELECT accession, id, num, family, ipro_family, start, stop, \
     rel_start, rel_stop, direction, type, seq_len, anno_status, desc, family_desc, \
     ipro_family_desc, color FROM neighbors WHERE gene_key = ? AND num BETWEEN ? AND ? ORDER BY num";

/// Optional `attributes` columns; older stores lack some of them.
const OPTIONAL_COLUMNS: [&str; 4] = ["evalue", "cluster_num", "uniref90_size", "uniref50_size"];

/// Parse `"lo-hi"` into inclusive bounds.
pub fn parse_range(raw: &str) -> Result<(i64, i64), GndError> {
    let malformed = || GndError::MalformedRange(raw.to_string());
    let (lo, hi) = raw.split_once('-').ok_or_else(malformed)?;
    let lo = lo.trim().parse().map_err(|_| malformed())?;
    let hi = hi.trim().parse().map_err(|_| malformed())?;
    Ok((lo, hi))
}

/// Number of indices in `lo..=hi`; zero when `hi < lo`.
pub fn span_len(lo: i64, hi: i64) -> Result<i64, GndError> {
    if hi < lo {
        return Ok(0);
    }
    hi.checked_sub(lo)
        .and_then(|width| width.checked_add(1))
        .ok_or_else(|| GndError::InvalidParam {
            name: "range",
            value: format!("{lo}-{hi}"),
        })
}

/// Loads diagrams for one request against one store.
pub struct Assembler<'a> {
    db: &'a mut Db,
    profile: SchemaProfile,
    request: &'a Request,
    job: JobClass,
    attribute_query: String,
    optional: [bool; 4],
}

impl<'a> Assembler<'a> {
    pub fn new(db: &'a mut Db, profile: SchemaProfile, request: &'a Request) -> Result<Self> {
        let job = JobClass::classify(db, request)?;
        let mut optional = [false; 4];
        let mut columns = ATTRIBUTE_COLUMNS.to_string();
        for (present, column) in optional.iter_mut().zip(OPTIONAL_COLUMNS) {
            *present = db.column_exists(column, "attributes")?;
            if *present {
                columns.push_str(", ");
                columns.push_str(column);
            }
        }
        debug!(?job, ?optional, profile = profile.name(), "assembler ready");
        Ok(Self {
            db,
            profile,
            request,
            job,
            attribute_query: format!("SELECT {columns} FROM attributes WHERE cluster_index = ?"),
            optional,
        })
    }

    /// Resolve, load, filter and order the diagrams for `lo..=hi`.
    pub fn assemble(&mut self, lo: i64, hi: i64) -> Result<Vec<DiagramElement>> {
        let indices = self.resolve_indices(lo, hi)?;
        let keep_children = self.request.lowest_nesting_level();

        let mut elements = Vec::new();
        for idx in indices {
            let idx = if self.request.translates_members() {
                self.member_to_cluster(idx)?
            } else {
                idx
            };
            let attributes = self.load_attributes(idx)?;
            let neighbors = self.load_neighbors(idx, attributes.num)?;
            if attributes.is_cluster_child() && !keep_children {
                continue;
            }
            elements.push(DiagramElement {
                attributes,
                neighbors,
            });
        }

        if !keep_children {
            let by_uniref90 = self.request.sorts_by_uniref90();
            elements.sort_by_key(|elem| {
                let size = if by_uniref90 {
                    elem.attributes.uniref90_size
                } else {
                    elem.attributes.uniref50_size
                };
                std::cmp::Reverse(size.flatten().unwrap_or(0))
            });
        }
        Ok(elements)
    }

    /// Cluster jobs address diagrams by UniRef position; map those to cluster indices.
    fn resolve_indices(&mut self, lo: i64, hi: i64) -> Result<Box<dyn Iterator<Item = i64>>> {
        if self.job.direct {
            return Ok(Box::new(lo..=hi));
        }
        let table = self.profile.range_table()?;
        let rows = self.db.execute(
            &format!("SELECT cluster_index FROM {table} WHERE uniref_index BETWEEN ? AND ?"),
            &[SqlValue::Integer(lo), SqlValue::Integer(hi)],
        )?;
        let indices = rows
            .iter()
            .map(|row| int_at(row, 0, "cluster_index"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(indices.into_iter()))
    }

    fn member_to_cluster(&mut self, member_index: i64) -> Result<i64> {
        let table = self.profile.index_table()?;
        let value = self.db.scalar(
            &format!("SELECT cluster_index FROM {table} WHERE member_index = ?"),
            &[SqlValue::Integer(member_index)],
            &format!("{table} for member {member_index}"),
        )?;
        as_i64(&value).ok_or_else(|| not_numeric("cluster_index"))
    }

    fn load_attributes(&mut self, idx: i64) -> Result<Attributes> {
        let rows = self
            .db
            .execute(&self.attribute_query, &[SqlValue::Integer(idx)])?;
        let row = rows
            .first()
            .ok_or_else(|| GndError::missing_row(format!("attributes for index {idx}")))?;

        let families = FamilyValues::parse(
            &text_or_empty(row, 3),
            &text_or_empty(row, 4),
            &text_or_empty(row, 17),
            &text_or_empty(row, 18),
        );

        let mut attributes = Attributes {
            accession: text_at(row, 0),
            id: text_at(row, 1),
            num: int_at(row, 2, "num")?,
            families,
            start: value_at(row, 5),
            stop: value_at(row, 6),
            rel_start_coord: real_at(row, 7, "rel_start")?,
            rel_stop_coord: real_at(row, 8, "rel_stop")?,
            strain: text_at(row, 9),
            direction: text_at(row, 10),
            gene_type: text_at(row, 11),
            seq_len: value_at(row, 12),
            organism: text_at(row, 13)
                .map(|organism| organism.trim_end_matches('.').to_string())
                .unwrap_or_default(),
            taxon_id: value_at(row, 14),
            anno_status: text_at(row, 15),
            desc: text_at(row, 16),
            color: colors(row, 19),
            sort_order: value_at(row, 20),
            is_bound: value_at(row, 21),
            pid: -1,
            rel_start: 0.0,
            rel_width: 0.0,
            evalue: None,
            cluster_num: None,
            uniref90_size: None,
            uniref50_size: None,
        };

        let mut col = 22;
        let [has_evalue, has_cluster_num, has_ur90, has_ur50] = self.optional;
        if has_evalue {
            attributes.evalue = row.get(col).and_then(as_f64);
            col += 1;
        }
        if has_cluster_num {
            if self.job.gnn {
                attributes.cluster_num = opt_int_at(row, col);
            }
            col += 1;
        }
        // present-but-NULL sizes stay Some(None)
        if has_ur90 {
            attributes.uniref90_size = Some(opt_int_at(row, col));
            col += 1;
        }
        if has_ur50 {
            attributes.uniref50_size = Some(opt_int_at(row, col));
        }
        Ok(attributes)
    }

    /// Neighbors are keyed one past the focal `cluster_index`.
    fn load_neighbors(&mut self, idx: i64, num: i64) -> Result<Vec<Neighbor>> {
        let window = self.request.window;
        let bad_window = || GndError::InvalidParam {
            name: "window",
            value: window.to_string(),
        };
        let gene_key = idx.checked_add(1).ok_or_else(|| GndError::InvalidParam {
            name: "range",
            value: idx.to_string(),
        })?;
        let first = num.checked_sub(window).ok_or_else(bad_window)?;
        let last = num.checked_add(window).ok_or_else(bad_window)?;
        let rows = self.db.execute(
            NEIGHBOR_QUERY,
            &[
                SqlValue::Integer(gene_key),
                SqlValue::Integer(first),
                SqlValue::Integer(last),
            ],
        )?;
        rows.iter().map(neighbor_from_row).collect()
    }
}

fn neighbor_from_row(row: &Row) -> Result<Neighbor> {
    Ok(Neighbor {
        accession: text_at(row, 0),
        id: text_at(row, 1),
        num: int_at(row, 2, "num")?,
        families: FamilyValues::parse(
            &text_or_empty(row, 3),
            &text_or_empty(row, 4),
            &text_or_empty(row, 14),
            &text_or_empty(row, 15),
        ),
        start: value_at(row, 5),
        stop: value_at(row, 6),
        rel_start_coord: real_at(row, 7, "rel_start")?,
        rel_stop_coord: real_at(row, 8, "rel_stop")?,
        direction: text_at(row, 9),
        gene_type: text_at(row, 10),
        seq_len: value_at(row, 11),
        anno_status: text_at(row, 12),
        desc: text_at(row, 13),
        color: colors(row, 16),
        rel_start: 0.0,
        rel_width: 0.0,
    })
}

fn text_at(row: &Row, idx: usize) -> Option<String> {
    row.get(idx).and_then(as_text)
}

fn text_or_empty(row: &Row, idx: usize) -> String {
    text_at(row, idx).unwrap_or_default()
}

fn value_at(row: &Row, idx: usize) -> StoreValue {
    StoreValue(row.get(idx).cloned().unwrap_or(SqlValue::Null))
}

fn opt_int_at(row: &Row, idx: usize) -> Option<i64> {
    row.get(idx).and_then(as_i64)
}

fn int_at(row: &Row, idx: usize, column: &'static str) -> Result<i64> {
    opt_int_at(row, idx).ok_or_else(|| not_numeric(column))
}

fn real_at(row: &Row, idx: usize, column: &'static str) -> Result<f64> {
    row.get(idx)
        .and_then(as_f64)
        .ok_or_else(|| not_numeric(column))
}

fn not_numeric(column: &'static str) -> anyhow::Error {
    anyhow::anyhow!("column {column} is missing or not numeric")
}

fn colors(row: &Row, idx: usize) -> Vec<String> {
    match text_at(row, idx) {
        Some(raw) if !raw.is_empty() => raw.split(',').map(str::to_string).collect(),
        _ => vec![String::new()],
    }
}
