use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of records requested per account fetch.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ─── Raw Activity ─────────────────────────────────────────────────

/// One activity entry as sent by the remote, before it is bound to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawActivity {
    /// Servers send the id as a number or as a numeric string.
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// Server timestamp, usually RFC 3339.
    #[serde(default)]
    pub date: Option<String>,
}

fn id_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(i64),
        Text(String),
    }

    match Option::<Id>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Id::Number(n)) => Ok(n),
        Some(Id::Text(text)) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ─── Activity Record ──────────────────────────────────────────────

/// A single activity event owned by one account.
///
/// Identity is `(account_name, id)`. Records are never mutated after they
/// are built; the aggregator replaces whole sublists instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    id: i64,
    account_name: String,
    subject: String,
    message: String,
    file_path: Option<String>,
    link: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl ActivityRecord {
    pub fn new(id: i64, account_name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id,
            account_name: account_name.into(),
            subject: subject.into(),
            message: String::new(),
            file_path: None,
            link: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Bind a raw server entry to `account_name`.
    ///
    /// Empty `file`/`link` strings become `None`; an unparseable `date`
    /// leaves the timestamp unset.
    pub fn from_raw(account_name: &str, raw: &RawActivity) -> Self {
        Self {
            id: raw.id,
            account_name: account_name.to_owned(),
            subject: raw.subject.clone(),
            message: raw.message.clone(),
            file_path: non_empty(raw.file.as_deref()),
            link: non_empty(raw.link.as_deref()),
            timestamp: raw.date.as_deref().and_then(parse_timestamp),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Parse a server timestamp. Accepts RFC 3339 and the zone-less
/// `YYYY-MM-DDTHH:MM:SS` form (taken as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

// ─── Fetch Protocol: Model <-> Gateway ────────────────────────────

/// A request for one page of an account's activities, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Monotonic per-model id; distinguishes a superseded request from the
    /// one currently in flight for the same account.
    pub request_id: u64,
    pub account_name: String,
    pub page: u32,
    pub page_size: u32,
}

/// Result of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Records(Vec<RawActivity>),
    /// The remote reports the activity feature as disabled for this account.
    /// Any records it still sent are kept.
    FeatureUnavailable(Vec<RawActivity>),
    /// Transport or decode failure. No records arrived.
    Failed(String),
}

impl FetchOutcome {
    pub fn records(&self) -> &[RawActivity] {
        match self {
            Self::Records(records) | Self::FeatureUnavailable(records) => records,
            Self::Failed(_) => &[],
        }
    }

    pub fn is_feature_unavailable(&self) -> bool {
        matches!(self, Self::FeatureUnavailable(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Delivered exactly once per issued [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCompletion {
    pub request: FetchRequest,
    pub outcome: FetchOutcome,
}

// ─── Notifications: Model -> Observers ────────────────────────────

/// Change notification emitted by the aggregation model.
///
/// Row ranges are half-open: `[start, start + count)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelEvent {
    RowsInserted { start: usize, count: usize },
    RowsRemoved { start: usize, count: usize },
    /// Out-of-band: the account's server has the activity feature disabled.
    FeatureUnavailable { account: String },
}

impl ModelEvent {
    /// True for insert/remove events, which invalidate any cached row mapping.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::RowsInserted { .. } | Self::RowsRemoved { .. })
    }
}

// ─── Tests ────────────────────────────────────────────────────────
