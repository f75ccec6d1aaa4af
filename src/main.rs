mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod workspace;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.settings.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(&cli.settings).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Select { path, pages } => {
            commands::select::run(&path, &pages)?;
        }
        Commands::Remove {
            path,
            pages,
            output,
            allow_empty,
        } => {
            commands::remove::run(&path, &pages, output.as_deref(), allow_empty)?;
        }
        Commands::Preview {
            path,
            page,
            dpi,
            output,
        } => {
            let rasterizer = cli.settings.rasterizer();
            commands::preview::run(&rasterizer, &path, page, dpi, &output)?;
        }
    }

    Ok(())
}
