//! Gateway that runs each fetch on the tokio runtime and reports the result
//! back to the feed loop over a channel.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use activity_core::types::{FetchCompletion, FetchOutcome, FetchRequest};
use activity_gateway::FetchGateway;
use activity_source_ocs::ActivitySource;
use tokio::sync::mpsc;

pub struct SpawningGateway<S> {
    source: RwLock<Arc<S>>,
    completions: mpsc::UnboundedSender<FetchCompletion>,
    timeout: Duration,
}

impl<S: ActivitySource> SpawningGateway<S> {
    pub fn new(
        source: S,
        completions: mpsc::UnboundedSender<FetchCompletion>,
        timeout: Duration,
    ) -> Self {
        Self {
            source: RwLock::new(Arc::new(source)),
            completions,
            timeout,
        }
    }

    /// Source used by requests issued from now on. Tasks already running keep
    /// the one they started with.
    pub fn current_source(&self) -> Arc<S> {
        Arc::clone(&self.source.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_source(&self, source: S) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(source);
    }
}

impl<S: ActivitySource> FetchGateway for SpawningGateway<S> {
    /// Spawns the fetch; must be called from within a tokio runtime.
    ///
    /// The fetch runs in its own task so that a panicking source still
    /// produces a `Failed` completion.
    fn request(&self, request: FetchRequest) {
        let source = self.current_source();
        let completions = self.completions.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let fetch = {
                let request = request.clone();
                tokio::spawn(async move { tokio::time::timeout(timeout, source.fetch(request)).await })
            };
            let account = request.account_name.clone();
            let outcome = match fetch.await {
                Ok(Ok(Ok(outcome))) => outcome,
                Ok(Ok(Err(e))) => FetchOutcome::Failed(e.to_string()),
                Ok(Err(_)) => FetchOutcome::Failed(format!(
                    "fetch timed out after {}ms",
                    timeout.as_millis()
                )),
                Err(e) => {
                    tracing::error!(account = %account, error = %e, "fetch task failed");
                    FetchOutcome::Failed(format!("fetch task failed: {e}"))
                }
            };
            if completions
                .send(FetchCompletion { request, outcome })
                .is_err()
            {
                tracing::debug!(account = %account, "feed loop gone; completion discarded");
            }
        });
    }
}
