//! Per-account sublist: one account's records plus its fetch status.

use activity_core::types::ActivityRecord;
use serde::Serialize;

/// Where an account's sublist stands in its fetch cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SublistStatus {
    /// Registered (or refreshed) and waiting for a fetch to settle.
    #[default]
    Pending,
    Loaded,
    /// The server answered but has the activity feature disabled.
    FeatureUnavailable,
    /// The last fetch failed; existing records, if any, were kept.
    Failed,
}

/// Ordered activity records belonging to a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSublist {
    account_name: String,
    records: Vec<ActivityRecord>,
    status: SublistStatus,
}

impl AccountSublist {
    /// An empty sublist, eligible for its first fetch.
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            records: Vec::new(),
            status: SublistStatus::Pending,
        }
    }

    pub fn with_records(
        account_name: impl Into<String>,
        records: Vec<ActivityRecord>,
        status: SublistStatus,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            records,
            status,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn get(&self, offset: usize) -> Option<&ActivityRecord> {
        self.records.get(offset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn status(&self) -> SublistStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SublistStatus) {
        self.status = status;
    }
}
