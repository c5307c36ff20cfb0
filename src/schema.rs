use crate::db::Db;
use crate::error::GndError;
use crate::request::IdType;
use anyhow::Result;
use tracing::debug;

/// Which identifier-translation tables a job store carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaProfile {
    /// Caller asked for a non-UniRef identifier space explicitly.
    Direct,
    UniRef50,
    UniRef90,
    /// No UniRef tables were found when probing.
    SchemaLess,
}

impl SchemaProfile {
    /// Pick the profile from an explicit `id_type`, or probe the store when
    /// none was given. UniRef50 tables win over UniRef90 ones.
    pub fn resolve(db: &mut Db, id_type: &IdType) -> Result<Self> {
        let profile = match id_type {
            IdType::UniRef50 => SchemaProfile::UniRef50,
            IdType::UniRef90 => SchemaProfile::UniRef90,
            IdType::UniProt | IdType::Other(_) => SchemaProfile::Direct,
            IdType::Unspecified => {
                if db.table_exists("uniref50_cluster_index")? {
                    SchemaProfile::UniRef50
                } else if db.table_exists("uniref90_cluster_index")? {
                    SchemaProfile::UniRef90
                } else {
                    SchemaProfile::SchemaLess
                }
            }
        };
        debug!(profile = profile.name(), id_type = id_type.as_str(), "resolved schema profile");
        Ok(profile)
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaProfile::Direct => "direct",
            SchemaProfile::UniRef50 => "uniref50",
            SchemaProfile::UniRef90 => "uniref90",
            SchemaProfile::SchemaLess => "none",
        }
    }

    /// `(cluster_num, start_index, end_index)` table.
    pub fn cluster_index_table(self) -> &'static str {
        match self {
            SchemaProfile::UniRef50 => "uniref50_cluster_index",
            SchemaProfile::UniRef90 => "uniref90_cluster_index",
            SchemaProfile::Direct | SchemaProfile::SchemaLess => "cluster_index",
        }
    }

    /// `(uniref_id, uniref_index, start_index, end_index, cluster_index)` table.
    pub fn range_table(self) -> Result<&'static str, GndError> {
        match self {
            SchemaProfile::UniRef50 => Ok("uniref50_range"),
            SchemaProfile::UniRef90 => Ok("uniref90_range"),
            _ => Err(self.missing("range")),
        }
    }

    /// `(member_index, cluster_index)` table.
    pub fn index_table(self) -> Result<&'static str, GndError> {
        match self {
            SchemaProfile::UniRef50 => Ok("uniref50_index"),
            SchemaProfile::UniRef90 => Ok("uniref90_index"),
            _ => Err(self.missing("index")),
        }
    }

    fn missing(self, kind: &'static str) -> GndError {
        GndError::MissingTable {
            profile: self.name(),
            kind,
        }
    }
}
