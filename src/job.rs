use crate::db::{Db, as_text};
use crate::request::{IdType, Request};
use anyhow::Result;

const GNN_TYPE: &str = "gnn";

/// How a job store is keyed.
///
/// The two flags are not complements: a gnn store browsed with a UniRef id
/// is both, and a store without a `metadata` table counts as direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobClass {
    pub direct: bool,
    pub gnn: bool,
}

impl JobClass {
    pub fn classify(db: &mut Db, request: &Request) -> Result<Self> {
        Ok(Self {
            direct: is_direct_job(db, request)?,
            gnn: is_gnn_job(db)?,
        })
    }
}

/// `metadata.type`, or `None` when the store has no `metadata` table.
/// A table without a row is an error.
fn metadata_type(db: &mut Db) -> Result<Option<Option<String>>> {
    if !db.table_exists("metadata")? {
        return Ok(None);
    }
    let value = db.scalar("SELECT type FROM metadata", &[], "metadata")?;
    Ok(Some(as_text(&value)))
}

pub fn is_direct_job(db: &mut Db, request: &Request) -> Result<bool> {
    let keyed_directly = match metadata_type(db)? {
        Some(kind) => kind.as_deref() != Some(GNN_TYPE),
        None => true,
    };
    Ok(keyed_directly || request.has_uniref_id() || request.id_type == IdType::UniProt)
}

pub fn is_gnn_job(db: &mut Db) -> Result<bool> {
    Ok(matches!(metadata_type(db)?, Some(Some(kind)) if kind == GNN_TYPE))
}
