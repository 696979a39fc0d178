//! `activity-feed ls`: activities across all accounts, newest first.

use activity_core::types::ActivityRecord;
use activity_source_ocs::ActivitySource;
use chrono::{DateTime, Utc};

use crate::cli::LsOpts;
use crate::context::{one_line, time_ago, truncate};
use crate::feed_loop::ActivityFeed;

const SUBJECT_MAX: usize = 60;
const FILE_MAX: usize = 40;

/// Entry point for `activity-feed ls`.
pub async fn cmd_ls<S: ActivitySource>(
    feed: &mut ActivityFeed<S>,
    opts: &LsOpts,
) -> anyhow::Result<()> {
    feed.load().await;
    let output = render(feed, opts, Utc::now())?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Listing for the feed's current state, as table or JSON.
pub fn render<S: ActivitySource>(
    feed: &ActivityFeed<S>,
    opts: &LsOpts,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let rows = if opts.unsorted {
        feed.unsorted_rows()
    } else {
        feed.sorted_rows()
    };
    let unavailable: Vec<&str> = feed.unavailable_accounts().collect();

    if opts.json {
        let accounts: Vec<serde_json::Value> = feed
            .model()
            .account_names()
            .into_iter()
            .filter_map(|name| feed.model().sublist(name))
            .map(|sublist| {
                serde_json::json!({
                    "name": sublist.account_name(),
                    "status": sublist.status(),
                    "records": sublist.len(),
                })
            })
            .collect();
        let value = serde_json::json!({
            "accounts": accounts,
            "activities": rows,
            "unavailable": unavailable,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(format_ls(&rows, &unavailable, now))
}

pub fn unavailable_notice(account: &str) -> String {
    format!("Account {account} does not have activities enabled.")
}

/// Notices first, then one aligned row per activity.
pub fn format_ls(rows: &[&ActivityRecord], unavailable: &[&str], now: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = unavailable
        .iter()
        .map(|account| unavailable_notice(account))
        .collect();

    if rows.is_empty() {
        if lines.is_empty() {
            lines.push("(no activities)".to_string());
        }
        return lines.join("\n");
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|record| {
            [
                time_ago(record.timestamp(), now),
                record.account_name().to_string(),
                truncate(&one_line(record.subject()), SUBJECT_MAX),
                truncate(record.file_path().unwrap_or(""), FILE_MAX),
            ]
        })
        .collect();

    let header = ["WHEN", "ACCOUNT", "SUBJECT", "FILE"];
    let mut widths = header.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |row: &[&str]| -> String {
        let padded: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| crate::context::pad(cell, width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    lines.push(render_row(&header));
    for row in &cells {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(render_row(&refs));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_gateway::{ModelConfig, StaticDirectory};
    use activity_source_ocs::FileActivitySource;
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 2, 1, 12, 0, 0).unwrap()
    }

    fn record(id: i64, account: &str, subject: &str, hours_ago: i64) -> ActivityRecord {
        ActivityRecord::new(id, account, subject)
            .with_timestamp(now() - chrono::Duration::hours(hours_ago))
    }

    #[test]
    fn table_has_header_and_rows() {
        let a = record(1, "alice", "You changed a.txt", 2).with_file_path("/a.txt");
        let b = record(2, "bob", "You created b.txt", 30);
        let out = format_ls(&[&a, &b], &[], now());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("WHEN"));
        assert!(lines[1].starts_with("2h ago"));
        assert!(lines[1].contains("alice"));
        assert!(lines[1].ends_with("/a.txt"));
        assert!(lines[2].starts_with("1d ago"));
        // Columns line up.
        assert_eq!(lines[1].find("alice"), lines[2].find("bob"));
    }

    #[test]
    fn notices_precede_rows() {
        let a = record(1, "alice", "x", 1);
        let out = format_ls(&[&a], &["bob"], now());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Account bob does not have activities enabled.");
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("WHEN"));
    }

    #[test]
    fn empty_feed() {
        assert_eq!(format_ls(&[], &[], now()), "(no activities)");
        assert_eq!(
            format_ls(&[], &["bob"], now()),
            "Account bob does not have activities enabled."
        );
    }

    #[tokio::test]
    async fn json_lists_account_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let alice = dir.path().join("alice.json");
        let bob = dir.path().join("bob.json");
        std::fs::write(
            &alice,
            r#"{"ocs":{"meta":{"statuscode":100},"data":[{"id":1,"subject":"s","date":"2016-01-01T00:00:00Z"}]}}"#,
        )
        .expect("write");
        std::fs::write(&bob, r#"{"ocs":{"meta":{"statuscode":999},"data":[]}}"#).expect("write");

        let source = FileActivitySource::new()
            .with_feed("alice", &alice)
            .with_feed("bob", &bob)
            .with_feed("carol", dir.path().join("missing.json"));
        let directory = StaticDirectory::new()
            .with_account("alice", true)
            .with_account("bob", true)
            .with_account("carol", true);
        let mut feed =
            ActivityFeed::new(directory, source, ModelConfig::default(), Duration::from_secs(5));
        feed.load().await;

        let opts = LsOpts {
            unsorted: false,
            json: true,
        };
        let out = render(&feed, &opts, now()).expect("render");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");

        assert_eq!(value["accounts"][0]["name"], "alice");
        assert_eq!(value["accounts"][0]["status"], "loaded");
        assert_eq!(value["accounts"][0]["records"], 1);
        assert_eq!(value["accounts"][1]["status"], "feature_unavailable");
        assert_eq!(value["accounts"][2]["status"], "failed");
        assert_eq!(value["unavailable"], serde_json::json!(["bob"]));
        assert_eq!(value["activities"][0]["id"], 1);
    }

    #[test]
    fn undated_activity_shows_dash() {
        let a = ActivityRecord::new(1, "alice", "x");
        let out = format_ls(&[&a], &[], now());
        assert!(out.lines().nth(1).expect("row").starts_with('-'));
    }
}
