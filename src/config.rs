// Configuration module for gnd
// Reads from environment variables with sensible defaults

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Base-pair width of the full diagram at a scale factor of 1.
pub const MAX_WIDTH_BP: f64 = 300_000.0;

/// Scale factor used for stats calls and when the caller supplies none.
pub const DEFAULT_SCALE_FACTOR: f64 = 7.5;

/// Zoom in multiplies the scale factor by this, zoom out divides by it.
pub const ZOOM_FACTOR: f64 = 4.0;

/// Running minimum of rendered starts begins above any reachable value.
pub const MIN_PCT_SENTINEL: f64 = 2.0;

/// Running maximum of rendered ends begins below any reachable value.
pub const MAX_PCT_SENTINEL: f64 = -2.0;

/// Width reserved for the query gene on the right-hand side. Always zero for now.
pub const QUERY_WIDTH_RESERVED: f64 = 0.0;

/// Focal genes are always drawn starting at the horizontal center.
pub const FOCAL_REL_START: f64 = 0.5;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the per-job `<id>.sqlite` stores (GND_DATA_DIR)
    pub data_dir: PathBuf,

    /// Path of the CSV query audit log (GND_AUDIT_LOG)
    pub audit_log: PathBuf,

    /// Queries slower than this are logged as warnings (GND_SLOW_QUERY_MS)
    pub slow_query_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            audit_log: PathBuf::from("query_metrics.csv"),
            slow_query_ms: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("GND_DATA_DIR").filter(|val| !val.is_empty()) {
            config.data_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("GND_AUDIT_LOG").filter(|val| !val.is_empty()) {
            config.audit_log = PathBuf::from(val);
        }

        if let Some(val) = lookup("GND_SLOW_QUERY_MS") {
            if let Ok(parsed) = val.parse() {
                config.slow_query_ms = parsed;
            } else {
                warn!(
                    value = %val,
                    default = config.slow_query_ms,
                    "invalid GND_SLOW_QUERY_MS, using default"
                );
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

/// Scale factor after zooming in `steps` times (negative steps zoom out).
pub fn zoomed_scale_factor(scale_factor: f64, steps: i32) -> f64 {
    scale_factor * ZOOM_FACTOR.powi(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.audit_log, PathBuf::from("query_metrics.csv"));
        assert_eq!(config.slow_query_ms, 100);
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = [
            ("GND_DATA_DIR", "/srv/gnd"),
            ("GND_SLOW_QUERY_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/srv/gnd"));
        assert_eq!(config.audit_log, PathBuf::from("query_metrics.csv"));
        assert_eq!(config.slow_query_ms, 100);
    }

    #[test]
    fn test_zoom_steps() {
        assert_eq!(zoomed_scale_factor(DEFAULT_SCALE_FACTOR, 1), 30.0);
        assert_eq!(zoomed_scale_factor(DEFAULT_SCALE_FACTOR, -1), 1.875);
        assert_eq!(zoomed_scale_factor(DEFAULT_SCALE_FACTOR, 0), 7.5);
    }
}
