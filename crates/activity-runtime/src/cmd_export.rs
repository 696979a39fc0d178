//! `activity-feed export`: fixed-width report of every activity, in
//! per-account order.

use std::io::Write;
use std::path::Path;

use activity_core::types::ActivityRecord;
use activity_source_ocs::ActivitySource;
use anyhow::Context;

use crate::context::{one_line, pad};
use crate::feed_loop::ActivityFeed;

const ACCOUNT_WIDTH: usize = 30;
const TIMESTAMP_WIDTH: usize = 34;
const SUBJECT_WIDTH: usize = 10;
const FILE_WIDTH: usize = 30;
const MESSAGE_WIDTH: usize = 55;

const TIMESTAMP_FORMAT: &str = "%a %b %-d %H:%M:%S %Y";

/// Entry point for `activity-feed export`.
pub async fn cmd_export<S: ActivitySource>(
    feed: &mut ActivityFeed<S>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    feed.load().await;
    for account in feed.unavailable_accounts() {
        eprintln!("{}", crate::cmd_ls::unavailable_notice(account));
    }

    let report = format_export(feed.model().records());
    match output {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "activity report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(report.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// One left-aligned line per record: account, timestamp, subject, file,
/// message. Values wider than their column are written in full.
pub fn format_export<'a>(records: impl IntoIterator<Item = &'a ActivityRecord>) -> String {
    let mut out = String::new();
    for record in records {
        let timestamp = record
            .timestamp()
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        out.push_str(&pad(record.account_name(), ACCOUNT_WIDTH));
        out.push_str(&pad(&timestamp, TIMESTAMP_WIDTH));
        out.push_str(&pad(record.subject(), SUBJECT_WIDTH));
        out.push_str(&pad(record.file_path().unwrap_or_default(), FILE_WIDTH));
        out.push_str(&pad(&one_line(record.message()), MESSAGE_WIDTH));
        out.push('\n');
    }
    out
}
