//! Translation from the OCS activity envelope to a [`FetchOutcome`].
//!
//! ```text
//! {"ocs": {"meta": {"status": "ok", "statuscode": 100},
//!          "data": [{"id": 7, "subject": "...", "date": "2016-..."}]}}
//! ```
//!
//! Entries are decoded one at a time through [`RawActivity`]'s serde impl:
//! ids may be numbers or numeric strings, unknown fields are ignored, and an
//! entry that does not decode is skipped without failing the page.

use activity_core::types::{FetchOutcome, RawActivity};
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;

/// OCS status code the activity endpoint uses when the app is disabled.
pub const FEATURE_UNAVAILABLE_STATUS: i64 = 999;

/// Decode a raw response body.
pub fn decode(body: &[u8]) -> Result<FetchOutcome, SourceError> {
    let value: Value = serde_json::from_slice(body)?;
    translate(&value)
}

/// Translate a parsed envelope.
pub fn translate(envelope: &Value) -> Result<FetchOutcome, SourceError> {
    let ocs = envelope.get("ocs").ok_or(SourceError::MissingEnvelope)?;
    let status_code = ocs
        .get("meta")
        .and_then(|meta| meta.get("statuscode"))
        .and_then(as_i64);

    let records: Vec<RawActivity> = match ocs.get("data") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match RawActivity::deserialize(entry) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable activity entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    if status_code == Some(FEATURE_UNAVAILABLE_STATUS) {
        Ok(FetchOutcome::FeatureUnavailable(records))
    } else {
        Ok(FetchOutcome::Records(records))
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
