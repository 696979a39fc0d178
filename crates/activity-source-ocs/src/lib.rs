//! activity-source-ocs: reads activity pages in the OCS envelope format
//! (`{"ocs": {"meta": .., "data": [..]}}`) and turns them into fetch outcomes.

pub mod error;
pub mod source;
pub mod translate;

pub use activity_core::types;
pub use error::SourceError;
pub use source::{ActivitySource, FileActivitySource};
pub use translate::{FEATURE_UNAVAILABLE_STATUS, decode};
