use thiserror::Error;

/// Failures raised by the engine itself, as opposed to store errors bubbling
/// up from rusqlite. Both end up in the error envelope through `anyhow`.
#[derive(Debug, Error)]
pub enum GndError {
    #[error("malformed range {0:?}: expected \"lo-hi\"")]
    MalformedRange(String),
    #[error("no row returned by {what}")]
    MissingRow { what: String },
    #[error("schema profile {profile} has no {kind} table")]
    MissingTable {
        profile: &'static str,
        kind: &'static str,
    },
    #[error("missing required parameter `{0}`")]
    MissingParam(&'static str),
    #[error("invalid value {value:?} for parameter `{name}`")]
    InvalidParam { name: &'static str, value: String },
    #[error("request needs either `query` or `range`")]
    NoMode,
}

impl GndError {
    pub fn missing_row(what: impl Into<String>) -> Self {
        GndError::MissingRow { what: what.into() }
    }
}
