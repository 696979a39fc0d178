//! Single-writer feed loop.
//!
//! The model and its sorted view are owned here and mutated only from this
//! task. Fetches run concurrently through [`SpawningGateway`]; their results
//! come back over a channel and are merged one at a time.

use std::collections::BTreeSet;
use std::time::Duration;

use activity_core::types::{ActivityRecord, FetchCompletion, ModelEvent};
use activity_gateway::{ActivityModel, ModelConfig, SortView, StaticDirectory};
use activity_source_ocs::ActivitySource;
use tokio::sync::mpsc;

use crate::dispatch::SpawningGateway;

pub type FeedModel<S> = ActivityModel<StaticDirectory, SpawningGateway<S>>;

pub struct ActivityFeed<S: ActivitySource> {
    model: FeedModel<S>,
    view: SortView,
    completions: mpsc::UnboundedReceiver<FetchCompletion>,
    /// Accounts whose server reported the activity feature as disabled.
    unavailable: BTreeSet<String>,
}

impl<S: ActivitySource> ActivityFeed<S> {
    pub fn new(
        directory: StaticDirectory,
        source: S,
        config: ModelConfig,
        fetch_timeout: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = SpawningGateway::new(source, tx, fetch_timeout);
        Self {
            model: ActivityModel::with_config(directory, gateway, config),
            view: SortView::new(),
            completions: rx,
            unavailable: BTreeSet::new(),
        }
    }

    // ── Driving ──────────────────────────────────────────────────────

    /// Fetch every eligible account and wait for all of them to settle.
    pub async fn load(&mut self) -> usize {
        let issued = self.model.fetch_more();
        tracing::debug!(issued, "initial fetch round");
        self.process_events();
        self.settle().await;
        issued
    }

    /// Re-fetch every registered account, then fetch any newly configured
    /// ones, and wait for the round to settle.
    pub async fn refresh_all(&mut self) -> usize {
        let accounts: Vec<String> = self
            .model
            .account_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let mut issued = accounts
            .iter()
            .filter_map(|account| self.model.refresh_account(account))
            .count();
        issued += self.model.fetch_more();
        tracing::debug!(issued, "refresh round");
        self.process_events();
        self.settle().await;
        issued
    }

    /// Merge completions until no fetch is in flight.
    ///
    /// Completions for deregistered accounts that were already queued are
    /// merged too, so the late-completion policy sees them.
    pub async fn settle(&mut self) {
        while self.model.in_flight_count() > 0 {
            let Some(completion) = self.completions.recv().await else {
                tracing::error!("completion channel closed with fetches in flight");
                return;
            };
            self.merge(completion);
        }
        while let Ok(completion) = self.completions.try_recv() {
            self.merge(completion);
        }
    }

    fn merge(&mut self, completion: FetchCompletion) {
        self.model.on_fetch_completed(completion);
        self.process_events();
    }

    /// Hand queued model notifications to the sorted view and record
    /// feature-unavailable accounts. Returns the events handled.
    pub fn process_events(&mut self) -> Vec<ModelEvent> {
        let events = self.model.drain_events();
        self.view.apply_all(&self.model, &events);
        for event in &events {
            if let ModelEvent::FeatureUnavailable { account } = event {
                if self.unavailable.insert(account.clone()) {
                    tracing::info!(account = %account, "activities not enabled for account");
                }
            }
        }
        events
    }

    // ── Account Changes ──────────────────────────────────────────────

    pub fn deregister(&mut self, account: &str) -> bool {
        let removed = self.model.deregister_account(account);
        if removed {
            self.unavailable.remove(account);
            self.process_events();
        }
        removed
    }

    pub fn directory_mut(&mut self) -> &mut StaticDirectory {
        self.model.directory_mut()
    }

    pub fn set_source(&self, source: S) {
        self.model.gateway().set_source(source);
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Newest first, across all accounts.
    pub fn sorted_rows(&self) -> Vec<&ActivityRecord> {
        self.view.rows(&self.model)
    }

    /// Per-account order, accounts in registration order.
    pub fn unsorted_rows(&self) -> Vec<&ActivityRecord> {
        self.model.records().collect()
    }

    pub fn unavailable_accounts(&self) -> impl Iterator<Item = &str> + '_ {
        self.unavailable.iter().map(String::as_str)
    }

    pub fn model(&self) -> &FeedModel<S> {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_core::types::{FetchOutcome, FetchRequest, RawActivity};
    use activity_gateway::{LateCompletionPolicy, SublistStatus};
    use activity_source_ocs::SourceError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        outcomes: HashMap<String, FetchOutcome>,
        slow: HashSet<String>,
        panics: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, account: &str, outcome: FetchOutcome) -> Self {
            self.outcomes.insert(account.to_owned(), outcome);
            self
        }

        fn slow(mut self, account: &str) -> Self {
            self.slow.insert(account.to_owned());
            self
        }

        fn panicking(mut self, account: &str) -> Self {
            self.panics.insert(account.to_owned());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl ActivitySource for FakeSource {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, SourceError> {
            self.calls
                .lock()
                .expect("lock")
                .push(request.account_name.clone());
            if self.panics.contains(&request.account_name) {
                panic!("fetch for {} blew up", request.account_name);
            }
            if self.slow.contains(&request.account_name) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            self.outcomes
                .get(&request.account_name)
                .cloned()
                .ok_or(SourceError::UnknownAccount(request.account_name))
        }
    }

    fn raw(id: i64, date: &str) -> RawActivity {
        RawActivity {
            id,
            subject: format!("activity {id}"),
            date: Some(date.to_owned()),
            ..RawActivity::default()
        }
    }

    fn directory(accounts: &[(&str, bool)]) -> StaticDirectory {
        accounts
            .iter()
            .fold(StaticDirectory::new(), |dir, (name, connected)| {
                dir.with_account(*name, *connected)
            })
    }

    fn feed(dir: StaticDirectory, source: FakeSource) -> ActivityFeed<FakeSource> {
        ActivityFeed::new(dir, source, ModelConfig::default(), Duration::from_secs(5))
    }

    fn ids(rows: &[&ActivityRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.id()).collect()
    }

    // ── 1. Aggregation ──

    #[tokio::test]
    async fn load_merges_accounts_newest_first() {
        let source = FakeSource::default()
            .with(
                "alice",
                FetchOutcome::Records(vec![
                    raw(1, "2016-01-05T00:00:00Z"),
                    raw(2, "2016-01-01T00:00:00Z"),
                ]),
            )
            .with(
                "bob",
                FetchOutcome::Records(vec![raw(3, "2016-01-03T00:00:00Z")]),
            );
        let mut feed = feed(directory(&[("alice", true), ("bob", true)]), source);

        assert_eq!(feed.load().await, 2);
        assert_eq!(ids(&feed.sorted_rows()), vec![1, 3, 2]);
        assert_eq!(ids(&feed.unsorted_rows()), vec![1, 2, 3]);
        assert_eq!(feed.model().in_flight_count(), 0);
        assert_eq!(feed.view.total_row_count(), 3);
    }

    #[tokio::test]
    async fn disconnected_account_is_not_fetched() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]))
            .with("bob", FetchOutcome::Records(vec![raw(2, "2016-01-02T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true), ("bob", false)]), source);

        assert_eq!(feed.load().await, 1);
        assert_eq!(feed.model.gateway().current_source().calls(), vec!["alice".to_string()]);
        assert_eq!(ids(&feed.sorted_rows()), vec![1]);
    }

    // ── 2. Feature unavailable ──

    #[tokio::test]
    async fn feature_unavailable_is_reported_once() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::FeatureUnavailable(Vec::new()))
            .with("bob", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true), ("bob", true)]), source);

        feed.load().await;
        feed.refresh_all().await;
        assert_eq!(feed.unavailable_accounts().collect::<Vec<_>>(), vec!["alice"]);
        assert_eq!(
            feed.model().sublist("alice").map(|s| s.status()),
            Some(SublistStatus::FeatureUnavailable)
        );
        assert_eq!(ids(&feed.sorted_rows()), vec![1]);
    }

    // ── 3. Failures ──

    #[tokio::test]
    async fn failed_fetch_is_not_retried() {
        // No outcome configured for bob: the source errors.
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true), ("bob", true)]), source);

        feed.load().await;
        assert_eq!(
            feed.model().sublist("bob").map(|s| s.status()),
            Some(SublistStatus::Failed)
        );
        assert!(!feed.model().has_more_to_fetch());
        assert_eq!(feed.load().await, 0);
        assert_eq!(feed.model.gateway().current_source().calls().len(), 2);
    }

    #[tokio::test]
    async fn timed_out_fetch_settles_as_failure() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]))
            .with("bob", FetchOutcome::Records(vec![raw(2, "2016-01-02T00:00:00Z")]))
            .slow("bob");
        let mut feed = ActivityFeed::new(
            directory(&[("alice", true), ("bob", true)]),
            source,
            ModelConfig::default(),
            Duration::from_millis(50),
        );

        feed.load().await;
        assert_eq!(ids(&feed.sorted_rows()), vec![1]);
        assert_eq!(
            feed.model().sublist("bob").map(|s| s.status()),
            Some(SublistStatus::Failed)
        );
    }

    #[tokio::test]
    async fn panicking_fetch_settles_as_failure() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]))
            .panicking("bob");
        let mut feed = feed(directory(&[("alice", true), ("bob", true)]), source);

        let issued = tokio::time::timeout(Duration::from_secs(3), feed.load())
            .await
            .expect("load settles");
        assert_eq!(issued, 2);
        assert_eq!(feed.model().in_flight_count(), 0);
        assert_eq!(ids(&feed.sorted_rows()), vec![1]);
        assert_eq!(
            feed.model().sublist("bob").map(|s| s.status()),
            Some(SublistStatus::Failed)
        );
    }

    // ── 4. Account changes ──

    #[tokio::test]
    async fn deregister_drops_rows_and_notice() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::FeatureUnavailable(vec![raw(1, "2016-01-01T00:00:00Z")]))
            .with("bob", FetchOutcome::Records(vec![raw(2, "2016-01-02T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true), ("bob", true)]), source);
        feed.load().await;
        assert_eq!(feed.sorted_rows().len(), 2);

        assert!(feed.deregister("alice"));
        assert!(!feed.deregister("alice"));
        assert_eq!(ids(&feed.sorted_rows()), vec![2]);
        assert_eq!(feed.unavailable_accounts().count(), 0);
    }

    #[tokio::test]
    async fn refresh_picks_up_new_accounts() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]))
            .with("carol", FetchOutcome::Records(vec![raw(9, "2016-02-01T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true)]), source);
        feed.load().await;

        feed.directory_mut().upsert("carol", true);
        feed.refresh_all().await;
        assert_eq!(ids(&feed.sorted_rows()), vec![9, 1]);
        assert_eq!(feed.model().account_names(), vec!["alice", "carol"]);
    }

    #[tokio::test]
    async fn late_completion_dropped_by_default() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]));
        let mut feed = feed(directory(&[("alice", true)]), source);

        feed.model.fetch_more();
        feed.deregister("alice");
        // The spawned fetch still completes; give it a chance to arrive.
        tokio::time::sleep(Duration::from_millis(50)).await;
        feed.settle().await;
        assert!(feed.sorted_rows().is_empty());
        assert!(feed.model().account_names().is_empty());
    }

    #[tokio::test]
    async fn late_completion_recreates_when_configured() {
        let source = FakeSource::default()
            .with("alice", FetchOutcome::Records(vec![raw(1, "2016-01-01T00:00:00Z")]));
        let config = ModelConfig {
            late_completion: LateCompletionPolicy::Recreate,
            ..ModelConfig::default()
        };
        let mut feed = ActivityFeed::new(
            directory(&[("alice", true)]),
            source,
            config,
            Duration::from_secs(5),
        );

        feed.model.fetch_more();
        feed.deregister("alice");
        tokio::time::sleep(Duration::from_millis(50)).await;
        feed.settle().await;
        assert_eq!(ids(&feed.sorted_rows()), vec![1]);
        assert_eq!(feed.view.total_row_count(), 1);
    }
}
