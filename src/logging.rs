use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Install the stderr subscriber for the binary. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level: {e}"))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| anyhow!("logging already initialized"))
}
