use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rover_cli::{log_filter, run, Args};

fn main() -> Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .json()
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    info!(?args, "starting rover");

    match run(&args) {
        Ok(out) => {
            println!("{}", out.trim_end());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "rover failed");
            Err(e)
        }
    }
}
