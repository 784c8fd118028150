use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{RefreshOptions, RefreshOutcome, ViewResult};

const LOG_PREFIX: &str = "refresh-";
const LOG_SUFFIX: &str = ".jsonl";
const MAX_LOG_FILES: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct RefreshLogEntry {
    pub(crate) ts_utc: i64,
    pub(crate) endpoint: String,
    pub(crate) status: String,
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) generated_at: Option<String>,
    #[serde(default)]
    pub(crate) options: RefreshOptions,
}

impl RefreshLogEntry {
    pub(crate) fn new(endpoint: &str, options: &RefreshOptions, outcome: &RefreshOutcome) -> Self {
        let generated_at = match outcome {
            RefreshOutcome::Updated { generated_at } => generated_at.clone(),
            _ => None,
        };
        Self {
            ts_utc: Utc::now().timestamp(),
            endpoint: endpoint.to_string(),
            status: outcome.status_label().to_string(),
            message: outcome.message(),
            generated_at,
            options: options.clone(),
        }
    }
}

fn log_file_path(log_dir: &Path) -> PathBuf {
    let date_str = Utc::now().format("%Y-%m-%d");
    log_dir.join(format!("{LOG_PREFIX}{date_str}{LOG_SUFFIX}"))
}

pub(crate) fn append_refresh_log(log_dir: &Path, entry: &RefreshLogEntry) -> ViewResult<()> {
    fs::create_dir_all(log_dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(log_dir))?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{}", json)?;
    Ok(())
}

/// Most recent entries, oldest first. Unreadable files and lines are skipped.
pub(crate) fn load_recent_refreshes(log_dir: &Path, limit: usize) -> Vec<RefreshLogEntry> {
    if limit == 0 {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = match fs::read_dir(log_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(LOG_PREFIX) && n.ends_with(LOG_SUFFIX))
                    .unwrap_or(false)
            })
            .collect(),
        Err(_) => return Vec::new(),
    };
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    files.truncate(MAX_LOG_FILES);

    let mut collected = Vec::new();
    for path in &files {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(_) => continue,
        };
        let entries: Vec<RefreshLogEntry> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();
        for entry in entries.into_iter().rev() {
            collected.push(entry);
            if collected.len() >= limit {
                collected.reverse();
                return collected;
            }
        }
    }
    collected.reverse();
    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("racecard_test")
            .join(format!("logs_{}_{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn appends_and_reads_back_in_order() {
        let dir = temp_log_dir("order");
        let options = RefreshOptions::default();
        for outcome in [
            RefreshOutcome::Busy,
            RefreshOutcome::Aborted {
                reason: "no new data".into(),
            },
            RefreshOutcome::Updated {
                generated_at: Some("2026-10-17T09:00:00+09:00".into()),
            },
        ] {
            let entry = RefreshLogEntry::new("http://localhost:5000/api/update/race", &options, &outcome);
            append_refresh_log(&dir, &entry).unwrap();
        }

        let all = load_recent_refreshes(&dir, 10);
        let statuses: Vec<&str> = all.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, vec!["busy", "aborted", "ok"]);
        assert_eq!(all[1].message, "update skipped: no new data");
        assert_eq!(all[2].generated_at.as_deref(), Some("2026-10-17T09:00:00+09:00"));

        assert!(load_recent_refreshes(&dir, 0).is_empty());

        let last_two = load_recent_refreshes(&dir, 2);
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].status, "aborted");
        assert_eq!(last_two[1].status, "ok");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn skips_garbage_lines_and_missing_dirs() {
        let dir = temp_log_dir("garbage");
        assert!(load_recent_refreshes(&dir, 5).is_empty());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("refresh-2026-01-01.jsonl"), "not json\n").unwrap();
        fs::write(dir.join("other.txt"), "{}\n").unwrap();
        assert!(load_recent_refreshes(&dir, 5).is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
