use anyhow::Result;
use clap::Parser;
use gnd::{cli, logging, rpc};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init_logging(&args.log_level)?;

    match args.command {
        cli::Command::Serve {
            data_dir,
            audit_log,
            no_audit,
        } => {
            let settings = rpc::Settings::resolve(data_dir, audit_log, no_audit);
            rpc::serve(settings)
        }
        cli::Command::Request {
            data_dir,
            audit_log,
            no_audit,
            params,
            params_file,
            zoom,
        } => {
            let settings = rpc::Settings::resolve(data_dir, audit_log, no_audit);
            let params_raw = if let Some(path) = params_file {
                std::fs::read_to_string(&path)?
            } else {
                params
            };
            let response = rpc::call(&settings, &params_raw, zoom)?;
            println!("{response}");
            Ok(())
        }
    }
}
