//! Timestamp-sorted projection over an [`ActivityModel`].
//!
//! The view never touches the model's storage. It keeps a cached permutation
//! (sorted position → model row) that is rebuilt when a structural
//! notification arrives, so reads cost one index lookup.

use activity_core::error::ActivityError;
use activity_core::types::{ActivityRecord, ModelEvent};
use chrono::{DateTime, Utc};

use crate::account_directory::AccountDirectory;
use crate::fetch::FetchGateway;
use crate::model::ActivityModel;

/// Most recent activity first, across all accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortView {
    /// `order[i]` is the model row shown at sorted position `i`.
    order: Vec<usize>,
    rebuilds: u64,
}

impl SortView {
    /// An empty view; call [`Self::rebuild`] or feed events before reading.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_model<D: AccountDirectory, G: FetchGateway>(model: &ActivityModel<D, G>) -> Self {
        let mut view = Self::new();
        view.rebuild(model);
        view
    }

    /// Handle one model notification. Returns `true` if the order was rebuilt.
    pub fn apply<D: AccountDirectory, G: FetchGateway>(
        &mut self,
        model: &ActivityModel<D, G>,
        event: &ModelEvent,
    ) -> bool {
        if event.is_structural() {
            self.rebuild(model);
            true
        } else {
            false
        }
    }

    /// Handle a batch of notifications with at most one rebuild.
    pub fn apply_all<D: AccountDirectory, G: FetchGateway>(
        &mut self,
        model: &ActivityModel<D, G>,
        events: &[ModelEvent],
    ) -> bool {
        if events.iter().any(ModelEvent::is_structural) {
            self.rebuild(model);
            true
        } else {
            false
        }
    }

    pub fn rebuild<D: AccountDirectory, G: FetchGateway>(&mut self, model: &ActivityModel<D, G>) {
        let timestamps: Vec<Option<DateTime<Utc>>> =
            model.records().map(ActivityRecord::timestamp).collect();
        self.order = sorted_order(&timestamps);
        self.rebuilds += 1;
        tracing::trace!(rows = self.order.len(), "sort view rebuilt");
    }

    pub fn total_row_count(&self) -> usize {
        self.order.len()
    }

    /// Model row index behind sorted position `index`.
    pub fn source_index(&self, index: usize) -> Option<usize> {
        self.order.get(index).copied()
    }

    /// Record at sorted position `index`.
    ///
    /// If the cached order no longer matches the model (a notification was
    /// missed), debug builds panic; release builds log and fall back to the
    /// model's own order.
    pub fn row_at<'m, D: AccountDirectory, G: FetchGateway>(
        &self,
        model: &'m ActivityModel<D, G>,
        index: usize,
    ) -> Result<&'m ActivityRecord, ActivityError> {
        let model_rows = model.total_row_count();
        debug_assert_eq!(
            self.order.len(),
            model_rows,
            "sort view out of sync with model"
        );
        if self.order.len() != model_rows {
            tracing::error!(
                cached = self.order.len(),
                model_rows,
                "sort view out of sync with model; reading unsorted"
            );
            return model.row_at(index);
        }
        match self.order.get(index) {
            Some(&source) => model.row_at(source),
            None => Err(ActivityError::IndexOutOfRange {
                index,
                len: self.order.len(),
            }),
        }
    }

    /// All records in sorted order.
    pub fn rows<'m, D: AccountDirectory, G: FetchGateway>(
        &self,
        model: &'m ActivityModel<D, G>,
    ) -> Vec<&'m ActivityRecord> {
        (0..self.total_row_count())
            .filter_map(|i| self.row_at(model, i).ok())
            .collect()
    }

    /// Number of times the order has been recomputed.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

/// Descending by timestamp, stable for ties.
///
/// Rows without a timestamp cannot be compared; they keep their own position
/// and the dated rows are sorted into the remaining positions. This keeps the
/// comparison total.
fn sorted_order(timestamps: &[Option<DateTime<Utc>>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..timestamps.len()).collect();
    let slots: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| timestamps[i].is_some())
        .collect();

    let mut dated = slots.clone();
    dated.sort_by(|&a, &b| timestamps[b].cmp(&timestamps[a]));

    for (slot, source) in slots.into_iter().zip(dated) {
        order[slot] = source;
    }
    order
}
