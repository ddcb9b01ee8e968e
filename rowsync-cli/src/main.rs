use clap::Parser;
use colored::*;

mod cli;
mod config;
mod destination;
mod schema;
mod source;
mod sync;

use cli::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        log::debug!("{:?}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
