//! PressPipe CLI — push locally authored articles into a headless CMS.
//!
//! Parses HTML files with YAML front matter, resolves category and media
//! references, and upserts everything over the store's REST API.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
