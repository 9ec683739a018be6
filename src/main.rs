use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lifeprogress::app::AppContext;
use lifeprogress::cli::{commands, Cli, Commands};
use lifeprogress::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Show { refresh } => {
            commands::show(&ctx, refresh).await?;
        }
        Commands::Source { kind } => {
            commands::source(&ctx, kind)?;
        }
        Commands::Refill { source } => {
            commands::refill(&ctx, source).await?;
        }
        Commands::Cache { kind, clear } => {
            commands::cache(&ctx, kind, clear)?;
        }
    }

    Ok(())
}
