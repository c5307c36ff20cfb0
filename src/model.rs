use crate::family::FamilyValues;
use rusqlite::types::Value as SqlValue;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Column value handed to the front end exactly as the store holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreValue(pub SqlValue);

impl Default for StoreValue {
    fn default() -> Self {
        StoreValue(SqlValue::Null)
    }
}

impl Serialize for StoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Integer(v) => serializer.serialize_i64(*v),
            SqlValue::Real(v) => serializer.serialize_f64(*v),
            SqlValue::Text(text) => serializer.serialize_str(text),
            SqlValue::Blob(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

/// Focal gene (or cluster representative) of one diagram.
#[derive(Debug, Serialize, Clone)]
pub struct Attributes {
    pub accession: Option<String>,
    pub id: Option<String>,
    pub num: i64,
    #[serde(flatten)]
    pub families: FamilyValues,
    pub start: StoreValue,
    pub stop: StoreValue,
    pub rel_start_coord: f64,
    pub rel_stop_coord: f64,
    pub strain: Option<String>,
    pub direction: Option<String>,
    #[serde(rename = "type")]
    pub gene_type: Option<String>,
    pub seq_len: StoreValue,
    pub organism: String,
    pub taxon_id: StoreValue,
    pub anno_status: Option<String>,
    pub desc: Option<String>,
    pub color: Vec<String>,
    pub sort_order: StoreValue,
    pub is_bound: StoreValue,
    pub pid: i64,
    pub rel_start: f64,
    pub rel_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evalue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_num: Option<i64>,
    /// Outer `None` when the store has no such column; inner `None` for NULL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniref90_size: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniref50_size: Option<Option<i64>>,
}

impl Attributes {
    /// Singleton member of a UniRef cluster, judged on whichever size columns
    /// the store has. A NULL size is never zero.
    pub fn is_cluster_child(&self) -> bool {
        match (self.uniref90_size, self.uniref50_size) {
            (Some(ur90), None) => ur90 == Some(0),
            (None, Some(ur50)) => ur50 == Some(0),
            (Some(ur90), Some(ur50)) => ur90 == Some(0) && ur50 == Some(0),
            (None, None) => false,
        }
    }
}

/// Flanking gene drawn around a focal gene.
#[derive(Debug, Serialize, Clone)]
pub struct Neighbor {
    pub accession: Option<String>,
    pub id: Option<String>,
    pub num: i64,
    #[serde(flatten)]
    pub families: FamilyValues,
    pub start: StoreValue,
    pub stop: StoreValue,
    pub rel_start_coord: f64,
    pub rel_stop_coord: f64,
    pub direction: Option<String>,
    #[serde(rename = "type")]
    pub gene_type: Option<String>,
    pub seq_len: StoreValue,
    pub anno_status: Option<String>,
    pub desc: Option<String>,
    pub color: Vec<String>,
    pub rel_start: f64,
    pub rel_width: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct DiagramElement {
    pub attributes: Attributes,
    pub neighbors: Vec<Neighbor>,
}

/// Shared scale of one data-mode response.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub legend_scale: f64,
    pub min_pct: f64,
    pub max_pct: f64,
    pub min_bp: f64,
    pub max_bp: f64,
    pub scale_factor: f64,
}

/// Whether the job carries UniRef member tables; serialized as `50`, `90` or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniRefPresence {
    UniRef50,
    UniRef90,
    Absent,
}

impl Serialize for UniRefPresence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UniRefPresence::UniRef50 => serializer.serialize_u8(50),
            UniRefPresence::UniRef90 => serializer.serialize_u8(90),
            UniRefPresence::Absent => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Stats {
    pub max_index: i64,
    pub scale_factor: f64,
    pub legend_scale: f64,
    pub min_bp: f64,
    pub max_bp: f64,
    pub query_width: f64,
    pub actual_max_width: f64,
    pub time_data: String,
    pub num_checked: i64,
    pub index_range: Vec<[i64; 2]>,
    pub has_uniref: UniRefPresence,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Counts {
    pub max: i64,
    pub invalid: Vec<i64>,
    pub displayed: i64,
}

/// Everything a data-mode (`range`) call returns besides the envelope flags.
#[derive(Debug, Serialize, Clone)]
pub struct DiagramPayload {
    pub time: String,
    pub counts: Counts,
    pub data: Vec<DiagramElement>,
    #[serde(flatten)]
    pub bounds: Bounds,
}

/// Result of a successful engine run.
#[derive(Debug, Clone)]
pub enum Outcome {
    Stats(Stats),
    Diagrams(DiagramPayload),
}

/// The single JSON object handed back for every request.
#[derive(Debug, Serialize, Clone)]
pub struct Response {
    pub message: String,
    pub error: bool,
    pub eod: bool,
    pub totaltime: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(flatten)]
    pub diagrams: Option<DiagramPayload>,
}

impl Response {
    pub fn success(outcome: Outcome, elapsed: Duration) -> Self {
        let (stats, diagrams) = match outcome {
            Outcome::Stats(stats) => (Some(stats), None),
            Outcome::Diagrams(payload) => (None, Some(payload)),
        };
        Self {
            message: String::new(),
            error: false,
            eod: false,
            totaltime: elapsed.as_secs_f64(),
            stats,
            diagrams,
        }
    }

    /// Error envelope; never carries partial results.
    pub fn failure(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            message: message.into(),
            error: true,
            eod: true,
            totaltime: elapsed.as_secs_f64(),
            stats: None,
            diagrams: None,
        }
    }

    pub fn from_result(result: anyhow::Result<Outcome>, elapsed: Duration) -> Self {
        match result {
            Ok(outcome) => Self::success(outcome, elapsed),
            Err(err) => Self::failure(format!("{err:#}"), elapsed),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
