//! Account directory capability: which accounts exist and which are reachable.
//!
//! Injected into [`crate::ActivityModel`] so that account state is owned by the
//! caller (config, credential store, tests) instead of a process-wide registry.

use std::sync::Arc;

/// Known accounts and their connection state.
pub trait AccountDirectory {
    /// All configured accounts, in the order they should be registered.
    fn accounts(&self) -> Vec<String>;

    /// Whether `account` is currently reachable. Unknown accounts are not.
    fn is_connected(&self, account: &str) -> bool;
}

impl<T: AccountDirectory + ?Sized> AccountDirectory for &T {
    fn accounts(&self) -> Vec<String> {
        (**self).accounts()
    }

    fn is_connected(&self, account: &str) -> bool {
        (**self).is_connected(account)
    }
}

impl<T: AccountDirectory + ?Sized> AccountDirectory for Arc<T> {
    fn accounts(&self) -> Vec<String> {
        (**self).accounts()
    }

    fn is_connected(&self, account: &str) -> bool {
        (**self).is_connected(account)
    }
}

// ─── Static Directory ────────────────────────────────────────────────

/// In-memory directory with a fixed account order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDirectory {
    entries: Vec<(String, bool)>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>, connected: bool) -> Self {
        self.upsert(account, connected);
        self
    }

    /// Add an account, or update the connection state of an existing one.
    pub fn upsert(&mut self, account: impl Into<String>, connected: bool) {
        let account = account.into();
        match self.entries.iter_mut().find(|(name, _)| *name == account) {
            Some(entry) => entry.1 = connected,
            None => self.entries.push((account, connected)),
        }
    }

    /// Returns `false` if the account is unknown.
    pub fn set_connected(&mut self, account: &str, connected: bool) -> bool {
        match self.entries.iter_mut().find(|(name, _)| name == account) {
            Some(entry) => {
                entry.1 = connected;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, account: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(name, _)| name != account);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AccountDirectory for StaticDirectory {
    fn accounts(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn is_connected(&self, account: &str) -> bool {
        self.entries
            .iter()
            .any(|(name, connected)| name == account && *connected)
    }
}
