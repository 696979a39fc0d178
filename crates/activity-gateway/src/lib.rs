//! activity-gateway: aggregates per-account activity sublists fetched from
//! several servers into one virtually concatenated row space, and serves a
//! timestamp-sorted projection of it to the display layer.

pub mod account_directory;
pub mod fetch;
pub mod model;
pub mod sort_view;
pub mod sublist;

pub use account_directory::{AccountDirectory, StaticDirectory};
pub use activity_core::types;
pub use fetch::{FetchGateway, RecordingGateway};
pub use model::{ActivityModel, LateCompletionPolicy, ModelConfig};
pub use sort_view::SortView;
pub use sublist::{AccountSublist, SublistStatus};
