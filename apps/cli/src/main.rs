//! cabundler CLI — trusted-certificate bundle builder.
//!
//! Downloads the CCADB intermediate and root certificate reports and
//! concatenates them into reusable PEM bundle files.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
