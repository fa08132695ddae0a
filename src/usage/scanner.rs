use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::models::canonical_model_name;
use super::types::*;

const LOG_EXTENSION: &str = "jsonl";

/// Filters applied while scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Case-sensitive substring a project directory name must contain
    pub project_filter: Option<String>,
    /// Inclusive lower bound on the local date, as "YYYY-MM-DD"
    pub min_date: Option<String>,
}

/// Scan every project directory under `root` and fold usage into
/// date × model buckets.
///
/// Dates are derived in the time zone `tz`; callers pass `chrono::Local`
/// to group by the machine's calendar day. Unreadable directories simply
/// contribute nothing. Unreadable files are counted in `file_errors` and
/// the scan moves on.
pub fn scan_projects<Tz: TimeZone>(root: &Path, options: &ScanOptions, tz: &Tz) -> ScanResult {
    let mut result = ScanResult::default();

    for project_dir in list_project_dirs(root) {
        let project_name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(filter) = options.project_filter.as_deref() {
            if !project_name.contains(filter) {
                continue;
            }
        }

        let log_files = list_log_files(&project_dir);
        tracing::debug!(project = %project_name, files = log_files.len(), "scanning project");
        result.files_discovered += log_files.len();

        for path in log_files {
            result.files_scanned += 1;
            if let Err(e) = scan_file(&path, options, tz, &mut result) {
                tracing::warn!(path = %path.display(), error = %e, "failed to read log file");
                result.file_errors += 1;
            }
        }
    }

    tracing::debug!(
        buckets = result.usage.len(),
        skipped = result.skipped.total(),
        malformed = result.skipped.malformed,
        missing_field = result.skipped.missing_field,
        bad_timestamp = result.skipped.bad_timestamp,
        before_cutoff = result.skipped.before_cutoff,
        "scan complete"
    );

    result
}

/// Immediate subdirectories of `root`, sorted by name
fn list_project_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
    }
    dirs.sort();
    dirs
}

/// Entries of a project directory with the log extension.
///
/// Not filtered to regular files: anything that looks like a log but cannot
/// be read should surface as a file error.
fn list_log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION) {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Read one log file line by line, folding every usable record.
///
/// Records folded before a read error are kept.
fn scan_file<Tz: TimeZone>(
    path: &Path,
    options: &ScanOptions,
    tz: &Tz,
    result: &mut ScanResult,
) -> std::io::Result<()> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let fallback_session = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    for line in reader.lines() {
        let line = line?;

        let record = match parse_line(&line, &fallback_session) {
            Ok(record) => record,
            Err(reason) => {
                result.skipped.record(reason);
                continue;
            }
        };

        let date = local_date(&record.timestamp, tz);
        if let Some(min_date) = options.min_date.as_deref() {
            // Zero-padded dates sort lexicographically
            if date.as_str() < min_date {
                result.skipped.record(SkipReason::BeforeCutoff);
                continue;
            }
        }

        let key = AggregateKey::new(date, canonical_model_name(&record.model_id));
        result.usage.entry(key).or_default().add(&record);
    }

    Ok(())
}

/// Parse a single JSONL line into a usage record.
///
/// Lines without a model, a non-empty usage object and a timestamp are the
/// common case in session logs (user turns, tool results, summaries).
pub fn parse_line(line: &str, fallback_session: &str) -> Result<UsageRecord, SkipReason> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SkipReason::Blank);
    }

    let entry: Value = serde_json::from_str(line).map_err(|_| SkipReason::Malformed)?;

    let message = entry.get("message");
    let model_id = message
        .and_then(|m| m.get("model"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingField)?;
    let usage = message
        .and_then(|m| m.get("usage"))
        .and_then(|v| v.as_object())
        .filter(|u| !u.is_empty())
        .ok_or(SkipReason::MissingField)?;
    let timestamp = entry
        .get("timestamp")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingField)?;

    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| SkipReason::BadTimestamp)?
        .with_timezone(&Utc);

    let tokens = |field: &str| usage.get(field).and_then(|v| v.as_u64()).unwrap_or(0);

    let session_id = entry
        .get("sessionId")
        .and_then(|v| v.as_str())
        .unwrap_or(fallback_session);

    Ok(UsageRecord {
        model_id: model_id.to_string(),
        timestamp,
        input_tokens: tokens("input_tokens"),
        output_tokens: tokens("output_tokens"),
        cache_creation_tokens: tokens("cache_creation_input_tokens"),
        cache_read_tokens: tokens("cache_read_input_tokens"),
        session_id: session_id.to_string(),
    })
}

/// Calendar date of an instant in `tz`, as "YYYY-MM-DD"
pub fn local_date<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String {
    timestamp
        .with_timezone(tz)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}
