//! Activity sources: where a fetch request's page actually comes from.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use activity_core::types::{FetchOutcome, FetchRequest, RawActivity};

use crate::error::SourceError;
use crate::translate::decode;

/// Asynchronously produces one page of activities for an account.
pub trait ActivitySource: Send + Sync + 'static {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchOutcome, SourceError>> + Send;
}

// ─── File Source ─────────────────────────────────────────────────────

/// Serves each account from a JSON file holding a captured OCS response.
#[derive(Debug, Clone, Default)]
pub struct FileActivitySource {
    feeds: HashMap<String, PathBuf>,
}

impl FileActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_feed(mut self, account: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.feeds.insert(account.into(), path.into());
        self
    }

    pub fn feed_path(&self, account: &str) -> Option<&Path> {
        self.feeds.get(account).map(PathBuf::as_path)
    }
}

impl ActivitySource for FileActivitySource {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, SourceError> {
        let path = self
            .feeds
            .get(&request.account_name)
            .ok_or_else(|| SourceError::UnknownAccount(request.account_name.clone()))?;

        let body = tokio::fs::read(path).await.map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let outcome = decode(&body)?;
        tracing::debug!(
            account = %request.account_name,
            path = %path.display(),
            records = outcome.records().len(),
            "read activity feed"
        );
        Ok(page(outcome, &request))
    }
}

/// Cut the requested page out of a full response.
fn page(outcome: FetchOutcome, request: &FetchRequest) -> FetchOutcome {
    let skip = request.page as usize * request.page_size as usize;
    let take = request.page_size as usize;
    let cut = |records: Vec<RawActivity>| -> Vec<RawActivity> {
        records.into_iter().skip(skip).take(take).collect()
    };
    match outcome {
        FetchOutcome::Records(records) => FetchOutcome::Records(cut(records)),
        FetchOutcome::FeatureUnavailable(records) => FetchOutcome::FeatureUnavailable(cut(records)),
        failed @ FetchOutcome::Failed(_) => failed,
    }
}
