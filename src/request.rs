use crate::config::DEFAULT_SCALE_FACTOR;
use crate::coords::check_scale_factor;
use crate::error::GndError;
use std::collections::BTreeMap;

/// Identifier space the caller is browsing, from the `id-type` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdType {
    /// No `id-type` given; the schema is probed instead.
    Unspecified,
    UniRef50,
    UniRef90,
    UniProt,
    Other(String),
}

impl IdType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" => IdType::Unspecified,
            "50" => IdType::UniRef50,
            "90" => IdType::UniRef90,
            "uniprot" => IdType::UniProt,
            other => IdType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            IdType::Unspecified => "",
            IdType::UniRef50 => "50",
            IdType::UniRef90 => "90",
            IdType::UniProt => "uniprot",
            IdType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Job-level summary for the cluster named by `query`.
    Stats { query: String },
    /// Diagrams for the inclusive index range `"lo-hi"`.
    Diagrams { range: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub mode: Mode,
    pub scale_factor: f64,
    pub window: i64,
    pub uniref_id: Option<String>,
    pub id_type: IdType,
}

impl Request {
    pub fn stats(query: impl Into<String>, window: i64) -> Self {
        Self {
            mode: Mode::Stats {
                query: query.into(),
            },
            scale_factor: DEFAULT_SCALE_FACTOR,
            window,
            uniref_id: None,
            id_type: IdType::Unspecified,
        }
    }

    pub fn diagrams(range: impl Into<String>, scale_factor: f64, window: i64) -> Self {
        Self {
            mode: Mode::Diagrams {
                range: range.into(),
            },
            scale_factor,
            window,
            uniref_id: None,
            id_type: IdType::Unspecified,
        }
    }

    pub fn with_uniref_id(mut self, uniref_id: impl Into<String>) -> Self {
        let uniref_id = uniref_id.into();
        self.uniref_id = (!uniref_id.is_empty()).then_some(uniref_id);
        self
    }

    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    pub fn has_uniref_id(&self) -> bool {
        self.uniref_id.is_some()
    }

    /// Member indices must go through the `*_index` table to reach a cluster index.
    pub fn translates_members(&self) -> bool {
        self.has_uniref_id() && self.id_type != IdType::UniProt
    }

    /// True when the caller is looking at individual proteins rather than clusters.
    pub fn lowest_nesting_level(&self) -> bool {
        self.id_type == IdType::UniProt
            || (self.id_type == IdType::UniRef90 && self.has_uniref_id())
    }

    /// Cluster ordering uses UniRef90 sizes when browsing 90-clusters or
    /// expanding a 50-cluster; otherwise UniRef50 sizes.
    pub fn sorts_by_uniref90(&self) -> bool {
        self.id_type == IdType::UniRef90
            || (self.id_type == IdType::UniRef50 && self.has_uniref_id())
    }
}

/// A parsed request plus the store it targets.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub store_id: String,
    pub request: Request,
}

/// Parameters naming the job store, checked in this order.
pub const STORE_ID_PARAMS: [&str; 3] = ["gnn-id", "direct-id", "upload-id"];

impl JobRequest {
    /// Build a request from widget parameters (`direct-id`, `window`, `range`, ...).
    ///
    /// `query` takes precedence over `range`; `key` is ignored.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, GndError> {
        let store_id = STORE_ID_PARAMS
            .iter()
            .find_map(|name| params.get(*name))
            .ok_or(GndError::MissingParam("upload-id"))?;
        validate_store_id(store_id)?;

        let window = parse_param::<i64>(params, "window")?;
        let uniref_id = params.get("uniref-id").cloned().unwrap_or_default();
        let id_type = IdType::parse(params.get("id-type").map(String::as_str).unwrap_or(""));

        let request = if let Some(query) = params.get("query") {
            Request::stats(query.clone(), window)
        } else if let Some(range) = params.get("range") {
            let scale_factor = check_scale_factor(parse_param::<f64>(params, "scale-factor")?)?;
            Request::diagrams(range.clone(), scale_factor, window)
        } else {
            return Err(GndError::NoMode);
        };

        Ok(Self {
            store_id: store_id.clone(),
            request: request.with_uniref_id(uniref_id).with_id_type(id_type),
        })
    }

    pub fn store_file_name(&self) -> String {
        format!("{}.sqlite", self.store_id)
    }
}

fn parse_param<T: std::str::FromStr>(
    params: &BTreeMap<String, String>,
    name: &'static str,
) -> Result<T, GndError> {
    let raw = params.get(name).ok_or(GndError::MissingParam(name))?;
    raw.trim().parse().map_err(|_| GndError::InvalidParam {
        name,
        value: raw.clone(),
    })
}

fn validate_store_id(store_id: &str) -> Result<(), GndError> {
    let valid = !store_id.is_empty()
        && !store_id.contains("..")
        && store_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(GndError::InvalidParam {
            name: "store id",
            value: store_id.to_string(),
        })
    }
}
