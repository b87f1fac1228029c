use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tidings::app::AppContext;
use tidings::cli::{Cli, Commands};
use tidings::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config).context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::CheckConfig => {
            println!("poll interval: {:?}", config.interval()?);
            println!("feeds:");
            for feed in &config.feeds {
                println!("  {} (enabled: {})", feed.url, feed.enabled);
            }
            println!("destinations: {:?}", config.destinations);
        }
        Commands::Once => {
            let ctx = AppContext::new(&config).context("failed to initialize")?;
            ctx.poller().run_cycle().await;
        }
        Commands::Run => {
            let period = config.interval()?;
            let ctx = AppContext::new(&config).context("failed to initialize")?;

            let dispatcher = ctx.dispatcher();
            let telegram = ctx.telegram.clone();
            tokio::spawn(async move {
                dispatcher.run(telegram).await;
            });

            ctx.poller().run(period).await;
        }
    }

    Ok(())
}
