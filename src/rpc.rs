use crate::config::{Config, DEFAULT_SCALE_FACTOR, zoomed_scale_factor};
use crate::engine;
use crate::model::Response;
use crate::request::JobRequest;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error};

/// Where job stores live and where query metrics go.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub audit_log: Option<PathBuf>,
}

impl Settings {
    /// CLI values win; the environment fills the gaps.
    pub fn resolve(data_dir: Option<PathBuf>, audit_log: Option<PathBuf>, no_audit: bool) -> Self {
        let config = Config::get();
        Self {
            data_dir: data_dir.unwrap_or_else(|| config.data_dir.clone()),
            audit_log: if no_audit {
                None
            } else {
                Some(audit_log.unwrap_or_else(|| config.audit_log.clone()))
            },
        }
    }
}

/// Answer one widget-style parameter object.
pub fn handle_params(params: &Map<String, Value>, settings: &Settings) -> Response {
    let started = Instant::now();
    let job = match JobRequest::from_params(&flatten_params(params)) {
        Ok(job) => job,
        Err(err) => return Response::failure(err.to_string(), started.elapsed()),
    };
    let db_path = settings.data_dir.join(job.store_file_name());
    debug!(store = %job.store_id, db = %db_path.display(), "dispatching request");
    engine::render(&db_path, job.request, settings.audit_log.as_deref())
}

/// Widget parameters arrive as strings; accept JSON numbers and booleans too.
fn flatten_params(params: &Map<String, Value>) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Apply `steps` zoom levels to `scale-factor` (default 7.5 when absent).
pub fn apply_zoom(params: &mut Map<String, Value>, steps: i32) {
    if steps == 0 {
        return;
    }
    let current = params
        .get("scale-factor")
        .and_then(|value| match value {
            Value::String(text) => text.trim().parse().ok(),
            other => other.as_f64(),
        })
        .unwrap_or(DEFAULT_SCALE_FACTOR);
    let zoomed = zoomed_scale_factor(current, steps);
    params.insert("scale-factor".to_string(), Value::String(zoomed.to_string()));
}

/// Answer a raw JSON line; anything but an object is an error envelope.
pub fn handle_line(line: &str, settings: &Settings) -> Response {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(params)) => handle_params(&params, settings),
        Ok(_) => Response::failure("invalid request: expected a JSON object", Default::default()),
        Err(err) => Response::failure(format!("invalid request: {err}"), Default::default()),
    }
}

pub fn serve(settings: Settings) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(value) => value,
            Err(err) => {
                error!(%err, "stdin error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&line, &settings);
        writeln!(stdout, "{}", response.to_json()?)?;
        stdout.flush()?;
    }

    Ok(())
}

pub fn call(settings: &Settings, params_raw: &str, zoom: i32) -> Result<String> {
    let value: Value = serde_json::from_str(params_raw).with_context(|| "parse params JSON")?;
    let mut params = match value {
        Value::Object(map) => map,
        _ => anyhow::bail!("params must be a JSON object"),
    };
    apply_zoom(&mut params, zoom);
    Ok(handle_params(&params, settings).to_json()?)
}
