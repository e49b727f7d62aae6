//! StrategyPipe server — IT strategy document pipeline.
//!
//! Accepts gap-analysis trigger requests, generates strategy artifacts in
//! the background, and hands the results off downstream.

mod api;
mod cli;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    cli::init_tracing(&cli);
    cli::run(cli).await
}
