//! Accounts file: which accounts exist, whether they are reachable, and where
//! each one's activity feed is read from.
//!
//! ```json
//! {"accounts": [
//!   {"name": "alice@cloud.example", "connected": true, "feed": "alice.json"}
//! ]}
//! ```
//!
//! Relative feed paths resolve against the accounts file's directory.

use std::path::{Path, PathBuf};

use activity_gateway::StaticDirectory;
use activity_source_ocs::FileActivitySource;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    #[serde(default = "default_connected")]
    pub connected: bool,
    pub feed: PathBuf,
}

fn default_connected() -> bool {
    true
}

impl FeedConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read accounts file {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("invalid accounts file {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_feeds(base);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        let mut seen = std::collections::HashSet::new();
        for account in &config.accounts {
            if !seen.insert(account.name.as_str()) {
                anyhow::bail!("duplicate account {}", account.name);
            }
        }
        Ok(config)
    }

    fn resolve_feeds(&mut self, base: &Path) {
        for account in &mut self.accounts {
            if account.feed.is_relative() {
                account.feed = base.join(&account.feed);
            }
        }
    }

    pub fn directory(&self) -> StaticDirectory {
        self.accounts
            .iter()
            .fold(StaticDirectory::new(), |dir, account| {
                dir.with_account(account.name.clone(), account.connected)
            })
    }

    pub fn source(&self) -> FileActivitySource {
        self.accounts
            .iter()
            .fold(FileActivitySource::new(), |source, account| {
                source.with_feed(account.name.clone(), account.feed.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_gateway::AccountDirectory;

    #[test]
    fn parse_with_defaults() {
        let config = FeedConfig::parse(
            r#"{"accounts": [
                {"name": "a", "feed": "a.json"},
                {"name": "b", "connected": false, "feed": "/srv/b.json"}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(config.accounts.len(), 2);
        assert!(config.accounts[0].connected);
        assert!(!config.accounts[1].connected);
    }

    #[test]
    fn duplicate_accounts_rejected() {
        let err = FeedConfig::parse(
            r#"{"accounts": [{"name": "a", "feed": "1.json"}, {"name": "a", "feed": "2.json"}]}"#,
        )
        .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate account a"));
    }

    #[test]
    fn load_resolves_relative_feeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accounts.json");
        std::fs::write(
            &path,
            r#"{"accounts": [{"name": "a", "feed": "feeds/a.json"}, {"name": "b", "feed": "/abs/b.json"}]}"#,
        )
        .expect("write");

        let config = FeedConfig::load(&path).expect("load");
        assert_eq!(config.accounts[0].feed, dir.path().join("feeds/a.json"));
        assert_eq!(config.accounts[1].feed, PathBuf::from("/abs/b.json"));

        let source = config.source();
        assert_eq!(
            source.feed_path("a"),
            Some(dir.path().join("feeds/a.json").as_path())
        );
    }

    #[test]
    fn missing_file_has_context() {
        let err = FeedConfig::load(Path::new("/nonexistent/accounts.json")).expect_err("missing");
        assert!(err.to_string().contains("failed to read accounts file"));
    }

    #[test]
    fn directory_preserves_order_and_connectivity() {
        let config = FeedConfig::parse(
            r#"{"accounts": [{"name": "z", "feed": "z"}, {"name": "a", "connected": false, "feed": "a"}]}"#,
        )
        .expect("parse");
        let dir = config.directory();
        assert_eq!(dir.accounts(), vec!["z".to_string(), "a".to_string()]);
        assert!(dir.is_connected("z"));
        assert!(!dir.is_connected("a"));
    }
}
