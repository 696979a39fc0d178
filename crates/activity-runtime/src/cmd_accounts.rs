//! `activity-feed accounts`: configured accounts and their connection state.

use crate::config::FeedConfig;
use crate::context::pad;

pub fn cmd_accounts(config: &FeedConfig) {
    println!("{}", format_accounts(config));
}

pub fn format_accounts(config: &FeedConfig) -> String {
    if config.accounts.is_empty() {
        return "(no accounts configured)".to_string();
    }
    let name_width = config
        .accounts
        .iter()
        .map(|a| a.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("ACCOUNT".len());

    let mut lines = vec![format!("{}  {:<12}  FEED", pad("ACCOUNT", name_width), "STATE")];
    for account in &config.accounts {
        let state = if account.connected {
            "connected"
        } else {
            "disconnected"
        };
        lines.push(format!(
            "{}  {:<12}  {}",
            pad(&account.name, name_width),
            state,
            account.feed.display()
        ));
    }
    lines.join("\n")
}
