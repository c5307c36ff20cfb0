use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gnd",
    version,
    about = "Genome neighborhood diagram data service",
    after_help = r#"Examples:
  gnd request --params '{"direct-id":"30093","window":10,"query":1,"stats":1}'
  gnd request --params '{"direct-id":"30093","window":10,"scale-factor":7.5,"range":"140-159","id-type":"uniprot"}'
  gnd request --params '{"gnn-id":"7671","window":20,"scale-factor":7.5,"range":"0-19","id-type":"90"}' --zoom 1
  gnd serve --data-dir /srv/gnd/jobs
"#
)]
pub struct Args {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run JSONL request loop over stdin/stdout.
    Serve {
        /// Directory holding `<id>.sqlite` job stores (default: GND_DATA_DIR or .).
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// CSV query audit log (default: GND_AUDIT_LOG or query_metrics.csv).
        #[arg(long)]
        audit_log: Option<PathBuf>,
        /// Do not write the query audit log.
        #[arg(long)]
        no_audit: bool,
    },
    /// Answer a single request and exit.
    Request {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        audit_log: Option<PathBuf>,
        #[arg(long)]
        no_audit: bool,
        /// Widget parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long, value_name = "PATH")]
        params_file: Option<PathBuf>,
        /// Zoom steps applied to scale-factor (negative zooms out).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        zoom: i32,
    },
}
