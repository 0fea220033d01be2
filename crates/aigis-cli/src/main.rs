use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod cli;
mod serve;

use cli::MainArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();

    let log_level = match LevelFilter::from_str(&args.log_level) {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Invalid log level: {}", args.log_level);
            std::process::exit(1);
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    serve::serve(args).await
}
