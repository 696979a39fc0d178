//! `activity-feed watch`: periodic refresh that follows edits to the
//! accounts file.

use std::path::Path;
use std::time::Duration;

use activity_gateway::AccountDirectory;
use activity_source_ocs::FileActivitySource;
use chrono::Utc;

use crate::cli::{LsOpts, WatchOpts};
use crate::config::FeedConfig;
use crate::feed_loop::ActivityFeed;

/// Entry point for `activity-feed watch`.
pub async fn cmd_watch(
    feed: &mut ActivityFeed<FileActivitySource>,
    config_path: &Path,
    opts: &WatchOpts,
) -> anyhow::Result<()> {
    feed.load().await;
    let ls_opts = LsOpts::default();
    let mut cycle: u32 = 0;

    loop {
        // Clear screen + cursor home
        print!("\x1b[2J\x1b[H");
        println!("{}", crate::cmd_ls::render(feed, &ls_opts, Utc::now())?);
        println!("\nactivity-feed watch (every {}s), Ctrl-C to quit", opts.interval);

        cycle += 1;
        if opts.cycles.is_some_and(|max| cycle >= max) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(opts.interval)) => {}
            _ = tokio::signal::ctrl_c() => { break; }
        }

        match FeedConfig::load(config_path) {
            Ok(config) => apply_config(feed, &config),
            Err(e) => tracing::warn!(error = %e, "keeping previous accounts"),
        }
        feed.refresh_all().await;
    }

    Ok(())
}

/// Bring the feed's accounts in line with a freshly loaded config.
///
/// Removed accounts are deregistered, connection state is updated in place,
/// new accounts are appended and fetched on the next refresh.
pub fn apply_config(feed: &mut ActivityFeed<FileActivitySource>, config: &FeedConfig) {
    let wanted = |name: &str| config.accounts.iter().any(|a| a.name == name);

    let removed: Vec<String> = feed
        .directory_mut()
        .accounts()
        .into_iter()
        .filter(|name| !wanted(name))
        .collect();
    for name in &removed {
        feed.deregister(name);
        feed.directory_mut().remove(name);
        tracing::info!(account = %name, "account removed from config");
    }

    for account in &config.accounts {
        feed.directory_mut().upsert(account.name.clone(), account.connected);
    }
    feed.set_source(config.source());
}
