use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::pricing::TokenCounts;

/// One usage-bearing line of a session log, discarded once folded.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    pub model_id: String,
    pub timestamp: DateTime<Utc>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub session_id: String,
}

/// Grouping key: local calendar date ("YYYY-MM-DD") and canonical model name.
///
/// Ordering is by date first, then model, which is the order every report
/// view walks the data in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AggregateKey {
    pub date: String,
    pub model: String,
}

impl AggregateKey {
    pub fn new(date: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            model: model.into(),
        }
    }
}

/// Accumulated usage for one date × model pair
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateBucket {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub message_count: u64,
    pub session_ids: HashSet<String>,
}

impl AggregateBucket {
    /// Fold one record into the bucket. Token sums saturate at `u64::MAX`.
    pub fn add(&mut self, record: &UsageRecord) {
        self.input_tokens = self.input_tokens.saturating_add(record.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(record.output_tokens);
        self.cache_creation_tokens = self
            .cache_creation_tokens
            .saturating_add(record.cache_creation_tokens);
        self.cache_read_tokens = self.cache_read_tokens.saturating_add(record.cache_read_tokens);
        self.message_count = self.message_count.saturating_add(1);
        if !self.session_ids.contains(&record.session_id) {
            self.session_ids.insert(record.session_id.clone());
        }
    }

    pub fn session_count(&self) -> usize {
        self.session_ids.len()
    }
}

impl TokenCounts for AggregateBucket {
    fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    fn cache_creation_tokens(&self) -> u64 {
        self.cache_creation_tokens
    }

    fn cache_read_tokens(&self) -> u64 {
        self.cache_read_tokens
    }
}

/// Sorted mapping produced by a scan and consumed by every report view.
pub type UsageMap = BTreeMap<AggregateKey, AggregateBucket>;

/// Why a line did not produce a record. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only line
    Blank,
    /// Not well-formed JSON (partial writes, truncated lines)
    Malformed,
    /// Valid JSON without a model, usage object or timestamp
    MissingField,
    /// Timestamp present but not RFC 3339
    BadTimestamp,
    /// Local date falls before the cutoff
    BeforeCutoff,
}

/// Per-reason tallies of skipped lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    pub blank: u64,
    pub malformed: u64,
    pub missing_field: u64,
    pub bad_timestamp: u64,
    pub before_cutoff: u64,
}

impl SkipStats {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Blank => self.blank += 1,
            SkipReason::Malformed => self.malformed += 1,
            SkipReason::MissingField => self.missing_field += 1,
            SkipReason::BadTimestamp => self.bad_timestamp += 1,
            SkipReason::BeforeCutoff => self.before_cutoff += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.blank + self.malformed + self.missing_field + self.bad_timestamp + self.before_cutoff
    }
}

/// Everything one scan pass produces
#[derive(Debug, Default)]
pub struct ScanResult {
    pub usage: UsageMap,
    pub files_scanned: usize,
    pub files_discovered: usize,
    pub file_errors: usize,
    pub skipped: SkipStats,
}
