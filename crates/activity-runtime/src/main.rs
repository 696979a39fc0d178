//! activity-feed: aggregated activity listing across several server accounts.

use std::time::Duration;

use activity_gateway::ModelConfig;
use activity_source_ocs::FileActivitySource;
use anyhow::Context;
use clap::Parser;

mod cli;
mod cmd_accounts;
mod cmd_export;
mod cmd_ls;
mod cmd_watch;
mod config;
mod context;
mod dispatch;
mod feed_loop;

use config::FeedConfig;
use feed_loop::ActivityFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("ACTIVITY_FEED_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config_path = args.config.clone().unwrap_or_else(cli::default_config_path);
    let config = FeedConfig::load(&config_path)
        .with_context(|| "run with --config <file> or set ACTIVITY_FEED_CONFIG")?;
    tracing::debug!(
        path = %config_path.display(),
        accounts = config.accounts.len(),
        "accounts loaded"
    );

    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Ls(cli::LsOpts::default()));

    let model_config = ModelConfig {
        page_size: args.page_size,
        late_completion: args.late_completion.into(),
    };
    let timeout = Duration::from_millis(args.fetch_timeout_ms);
    let open_feed = || -> ActivityFeed<FileActivitySource> {
        ActivityFeed::new(config.directory(), config.source(), model_config, timeout)
    };

    match command {
        cli::Command::Ls(opts) => {
            cmd_ls::cmd_ls(&mut open_feed(), &opts).await?;
        }
        cli::Command::Export(opts) => {
            cmd_export::cmd_export(&mut open_feed(), opts.output.as_deref()).await?;
        }
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(&mut open_feed(), &config_path, &opts).await?;
        }
        cli::Command::Accounts => {
            cmd_accounts::cmd_accounts(&config);
        }
    }

    Ok(())
}
