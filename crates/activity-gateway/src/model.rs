//! Aggregation model: one activity sublist per account, exposed as a single
//! virtually concatenated row space.
//!
//! The model:
//!
//! 1. Registers accounts in the order they appear (that order is the row order).
//! 2. Decides which accounts still need a fetch and issues at most one request
//!    per account through the injected [`FetchGateway`].
//! 3. Replaces an account's whole sublist when its fetch completes, queueing a
//!    remove-range for the old extent and an insert-range for the new one.
//! 4. Maps virtual row indices to records through cumulative sublist lengths.
//!
//! All mutation happens on the caller's thread; fetch completions arrive as
//! discrete [`FetchCompletion`] values.

use std::collections::HashMap;

use activity_core::error::ActivityError;
use activity_core::types::{
    ActivityRecord, DEFAULT_PAGE_SIZE, FetchCompletion, FetchOutcome, FetchRequest, ModelEvent,
};

use crate::account_directory::AccountDirectory;
use crate::fetch::FetchGateway;
use crate::sublist::{AccountSublist, SublistStatus};

// ─── Config ──────────────────────────────────────────────────────────

/// What to do with a completion that arrives after its account was
/// deregistered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LateCompletionPolicy {
    /// Discard it, including any feature-unavailable signal it carries.
    #[default]
    Drop,
    /// Re-create the account's sublist at the end of the row space.
    Recreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Records requested per fetch.
    pub page_size: u32,
    pub late_completion: LateCompletionPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            late_completion: LateCompletionPolicy::Drop,
        }
    }
}

// ─── Model ───────────────────────────────────────────────────────────

/// Aggregates per-account activity sublists.
#[derive(Debug)]
pub struct ActivityModel<D, G> {
    directory: D,
    gateway: G,
    config: ModelConfig,
    /// Registration order is row order.
    sublists: Vec<AccountSublist>,
    /// Account name → id of the request currently in flight.
    in_flight: HashMap<String, u64>,
    /// Account name → id of the most recent request ever issued for it.
    /// Survives deregistration.
    latest_request: HashMap<String, u64>,
    next_request_id: u64,
    /// Notifications not yet drained by observers, in emission order.
    events: Vec<ModelEvent>,
}

impl<D: AccountDirectory, G: FetchGateway> ActivityModel<D, G> {
    pub fn new(directory: D, gateway: G) -> Self {
        Self::with_config(directory, gateway, ModelConfig::default())
    }

    pub fn with_config(directory: D, gateway: G, config: ModelConfig) -> Self {
        Self {
            directory,
            gateway,
            config,
            sublists: Vec::new(),
            in_flight: HashMap::new(),
            latest_request: HashMap::new(),
            next_request_id: 0,
            events: Vec::new(),
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Append an empty sublist for `account` unless one exists.
    ///
    /// Returns `true` if the account was newly registered. No notification
    /// is queued: an empty sublist covers no rows.
    pub fn register_account(&mut self, account: &str) -> bool {
        if self.position(account).is_some() {
            return false;
        }
        self.sublists.push(AccountSublist::new(account));
        tracing::debug!(account, "registered activity account");
        true
    }

    /// Remove `account` and its rows.
    ///
    /// Queues a single `RowsRemoved` over the account's extent and clears its
    /// in-flight marker; the outbound request itself is not cancelled.
    /// Returns `false` (and does nothing) for an unknown account.
    pub fn deregister_account(&mut self, account: &str) -> bool {
        let Some(k) = self.position(account) else {
            tracing::debug!(account, "deregister ignored: unknown account");
            return false;
        };
        let start = self.start_offset(k);
        let removed = self.sublists.remove(k);
        self.events.push(ModelEvent::RowsRemoved {
            start,
            count: removed.len(),
        });
        if self.in_flight.remove(account).is_some() {
            tracing::debug!(account, "deregistered with a fetch in flight");
        }
        tracing::debug!(account, rows = removed.len(), "deregistered activity account");
        true
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Whether a call to [`Self::fetch_more`] would have anything to do.
    ///
    /// True when nothing is registered yet but the directory knows accounts,
    /// or when some registered account is empty, connected, idle and still
    /// pending. An account whose fetch has settled (even with zero records or
    /// a failure) stays out until it is refreshed.
    pub fn has_more_to_fetch(&self) -> bool {
        if self.sublists.is_empty() {
            return !self.directory.accounts().is_empty();
        }
        self.sublists.iter().any(|s| self.is_fetchable(s))
    }

    /// Issue a fetch for `account`.
    ///
    /// Returns `None` without side effects if the account is not connected or
    /// already has a fetch in flight. Otherwise registers the account if
    /// needed, marks it in flight and hands the request to the gateway.
    pub fn trigger_fetch(&mut self, account: &str) -> Option<FetchRequest> {
        if !self.directory.is_connected(account) {
            tracing::debug!(account, "fetch skipped: account not connected");
            return None;
        }
        if self.in_flight.contains_key(account) {
            tracing::debug!(account, "fetch skipped: already in flight");
            return None;
        }
        self.register_account(account);

        self.next_request_id = self.next_request_id.wrapping_add(1);
        let request = FetchRequest {
            request_id: self.next_request_id,
            account_name: account.to_owned(),
            page: 0,
            page_size: self.config.page_size,
        };
        self.in_flight
            .insert(account.to_owned(), request.request_id);
        self.latest_request
            .insert(account.to_owned(), request.request_id);
        tracing::debug!(
            account,
            request_id = request.request_id,
            page_size = request.page_size,
            "start fetching activities"
        );
        self.gateway.request(request.clone());
        Some(request)
    }

    /// Register every directory account not yet known and fetch every
    /// account that is eligible. Returns the number of requests issued.
    pub fn fetch_more(&mut self) -> usize {
        for account in self.directory.accounts() {
            self.register_account(&account);
        }
        let eligible: Vec<String> = self
            .sublists
            .iter()
            .filter(|s| self.is_fetchable(s))
            .map(|s| s.account_name().to_owned())
            .collect();
        eligible
            .iter()
            .filter_map(|account| self.trigger_fetch(account))
            .count()
    }

    /// Re-fetch a registered account. Current rows stay until the
    /// replacement arrives. Unknown accounts are ignored.
    pub fn refresh_account(&mut self, account: &str) -> Option<FetchRequest> {
        let Some(k) = self.position(account) else {
            tracing::debug!(account, "refresh ignored: unknown account");
            return None;
        };
        self.sublists[k].set_status(SublistStatus::Pending);
        self.trigger_fetch(account)
    }

    /// Merge a fetch result.
    ///
    /// Clears the in-flight marker, queues `FeatureUnavailable` when the
    /// server reported the feature as disabled, then swaps the account's
    /// sublist for one built from the returned records (order preserved).
    /// A failed fetch only marks the sublist as failed.
    pub fn on_fetch_completed(&mut self, completion: FetchCompletion) {
        let FetchCompletion { request, outcome } = completion;
        let account = request.account_name.as_str();

        match self.in_flight.get(account).copied() {
            Some(current) if current == request.request_id => {
                self.in_flight.remove(account);
            }
            Some(current) => {
                tracing::debug!(
                    account,
                    request_id = request.request_id,
                    current,
                    "dropping superseded fetch completion"
                );
                return;
            }
            // The marker was cleared by deregistration, or this request
            // already completed.
            None => {
                let recreate = self.config.late_completion == LateCompletionPolicy::Recreate
                    && self.position(account).is_none()
                    && self.latest_request.get(account) == Some(&request.request_id);
                if !recreate {
                    tracing::debug!(
                        account,
                        request_id = request.request_id,
                        "dropping late fetch completion"
                    );
                    return;
                }
                tracing::debug!(account, "applying late fetch completion");
            }
        }

        let position = self.position(account);
        if let FetchOutcome::Failed(reason) = &outcome {
            tracing::warn!(account, %reason, "activity fetch failed");
            if let Some(k) = position {
                self.sublists[k].set_status(SublistStatus::Failed);
            }
            return;
        }

        let status = if outcome.is_feature_unavailable() {
            tracing::info!(account, "activity feature not available on server");
            self.events.push(ModelEvent::FeatureUnavailable {
                account: account.to_owned(),
            });
            SublistStatus::FeatureUnavailable
        } else {
            SublistStatus::Loaded
        };

        let records: Vec<ActivityRecord> = outcome
            .records()
            .iter()
            .map(|raw| ActivityRecord::from_raw(account, raw))
            .collect();
        tracing::debug!(account, records = records.len(), "activities received");
        self.replace_sublist(AccountSublist::with_records(account, records, status));
    }

    /// Two-phase replace: remove the old extent (if the account had one), then
    /// insert the new one at the same start offset. Events are queued even for
    /// zero counts.
    fn replace_sublist(&mut self, sublist: AccountSublist) {
        let rows_before = self.total_row_count();
        let k = self
            .position(sublist.account_name())
            .unwrap_or(self.sublists.len());
        let start = self.start_offset(k);
        let new_len = sublist.len();

        let old_len = if k < self.sublists.len() {
            let old_len = self.sublists[k].len();
            self.events.push(ModelEvent::RowsRemoved {
                start,
                count: old_len,
            });
            old_len
        } else {
            0
        };

        if k < self.sublists.len() {
            self.sublists[k] = sublist;
        } else {
            self.sublists.push(sublist);
        }
        self.events.push(ModelEvent::RowsInserted {
            start,
            count: new_len,
        });

        let expected = rows_before - old_len + new_len;
        let actual = self.total_row_count();
        debug_assert_eq!(actual, expected, "row count drifted during replace");
        if actual != expected {
            tracing::error!(expected, actual, "row count drifted during replace");
        }
    }

    // ── Row Space ────────────────────────────────────────────────────

    /// Sum of all sublist lengths, recomputed on every call.
    pub fn total_row_count(&self) -> usize {
        self.sublists.iter().map(AccountSublist::len).sum()
    }

    /// Record at virtual row `index`.
    pub fn row_at(&self, index: usize) -> Result<&ActivityRecord, ActivityError> {
        let mut remaining = index;
        for sublist in &self.sublists {
            if let Some(record) = sublist.get(remaining) {
                return Ok(record);
            }
            remaining -= sublist.len();
        }
        Err(ActivityError::IndexOutOfRange {
            index,
            len: self.total_row_count(),
        })
    }

    /// All records in registration order; not sorted.
    pub fn flatten_all(&self) -> Vec<ActivityRecord> {
        self.records().cloned().collect()
    }

    /// Borrowing iterator over all records in row order.
    pub fn records(&self) -> impl Iterator<Item = &ActivityRecord> + '_ {
        self.sublists.iter().flat_map(|s| s.records().iter())
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Take all queued notifications in emission order.
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Registered accounts in row order.
    pub fn account_names(&self) -> Vec<&str> {
        self.sublists.iter().map(AccountSublist::account_name).collect()
    }

    pub fn sublist(&self, account: &str) -> Option<&AccountSublist> {
        self.sublists.iter().find(|s| s.account_name() == account)
    }

    pub fn is_in_flight(&self, account: &str) -> bool {
        self.in_flight.contains_key(account)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ── Internals ────────────────────────────────────────────────────

    fn position(&self, account: &str) -> Option<usize> {
        self.sublists
            .iter()
            .position(|s| s.account_name() == account)
    }

    /// First virtual row of `sublists[k]` (or one past the end for `k == len`).
    fn start_offset(&self, k: usize) -> usize {
        self.sublists[..k].iter().map(AccountSublist::len).sum()
    }

    fn is_fetchable(&self, sublist: &AccountSublist) -> bool {
        sublist.is_empty()
            && sublist.status() == SublistStatus::Pending
            && !self.in_flight.contains_key(sublist.account_name())
            && self.directory.is_connected(sublist.account_name())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
