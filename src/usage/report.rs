use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use super::pricing::{calculate_cost, TokenCounts};
use super::types::{AggregateBucket, UsageMap};

const TABLE_TITLE: &str = "Claude Code Token Usage - Per Model Per Day";
const SUMMARY_TITLE: &str = "Model Summary (all time)";
const SUMMARY_WIDTH: usize = 80;

pub const CSV_HEADER: &str =
    "date,model,input,output,cache_create,cache_read,total_tokens,cost_usd,messages,sessions";

/// Usage for one model summed across every date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelTotals {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub message_count: u64,
    pub active_days: usize,
}

impl TokenCounts for ModelTotals {
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

/// Running sums for subtotal and grand-total rows
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_tokens: u64,
    cache_read_tokens: u64,
    message_count: u64,
    cost: f64,
}

impl Totals {
    fn add(&mut self, bucket: &AggregateBucket, cost: f64) {
        self.input_tokens = self.input_tokens.saturating_add(bucket.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(bucket.output_tokens);
        self.cache_creation_tokens = self
            .cache_creation_tokens
            .saturating_add(bucket.cache_creation_tokens);
        self.cache_read_tokens = self.cache_read_tokens.saturating_add(bucket.cache_read_tokens);
        self.message_count = self.message_count.saturating_add(bucket.message_count);
        self.cost += cost;
    }
}

impl TokenCounts for Totals {
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

/// Abbreviate a token count for display: `1.23B`, `4.5M`, `6.7K` or the exact
/// number below one thousand.
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000_000 {
        return format!("{:.2}B", n as f64 / 1_000_000_000.0);
    }
    if n >= 1_000_000 {
        return format!("{:.1}M", n as f64 / 1_000_000.0);
    }
    if n >= 1_000 {
        return format!("{:.1}K", n as f64 / 1_000.0);
    }
    n.to_string()
}

fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

fn table_header() -> String {
    format!(
        "{:<12} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "Date", "Model", "Input", "Output", "C.Create", "C.Read", "Total", "Cost", "Msgs"
    )
}

/// Render the per-day table: one row per date × model, a day subtotal when a
/// date has more than one model, and a grand-total row.
pub fn render_table(usage: &UsageMap) -> String {
    let mut out = String::new();
    if usage.is_empty() {
        out.push_str("No data found.\n");
        return out;
    }

    let header = table_header();
    let rule = "=".repeat(header.len());
    let sep = "-".repeat(header.len());

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "  {}", TABLE_TITLE);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", sep);

    let mut grand = Totals::default();
    let mut dates = usage.iter().peekable();

    while let Some((first_key, _)) = dates.peek() {
        let date = first_key.date.clone();
        let mut day = Totals::default();
        let mut rows = 0usize;

        while let Some((key, bucket)) = dates.next_if(|(k, _)| k.date == date) {
            let cost = calculate_cost(&key.model, bucket);
            let _ = writeln!(
                out,
                "{:<12} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
                key.date,
                key.model,
                format_tokens(bucket.input_tokens),
                format_tokens(bucket.output_tokens),
                format_tokens(bucket.cache_creation_tokens),
                format_tokens(bucket.cache_read_tokens),
                format_tokens(bucket.total_tokens()),
                format_cost(cost),
                bucket.message_count
            );
            day.add(bucket, cost);
            grand.add(bucket, cost);
            rows += 1;
        }

        if rows > 1 {
            let _ = writeln!(
                out,
                "{:.<12} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                "",
                "[day total]",
                "",
                "",
                "",
                "",
                format_tokens(day.total_tokens()),
                format_cost(day.cost)
            );
        }
        let _ = writeln!(out, "{}", sep);
    }

    let _ = writeln!(
        out,
        "{:<12} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "TOTAL",
        "ALL",
        format_tokens(grand.input_tokens),
        format_tokens(grand.output_tokens),
        format_tokens(grand.cache_creation_tokens),
        format_tokens(grand.cache_read_tokens),
        format_tokens(grand.total_tokens()),
        format_cost(grand.cost),
        grand.message_count
    );
    let _ = writeln!(out, "{}\n", rule);

    out
}

/// Render one CSV row per date × model with exact integer token counts.
pub fn render_csv(usage: &UsageMap) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", CSV_HEADER);

    for (key, bucket) in usage {
        let cost = calculate_cost(&key.model, bucket);
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{:.2},{},{}",
            csv_field(&key.date),
            csv_field(&key.model),
            bucket.input_tokens,
            bucket.output_tokens,
            bucket.cache_creation_tokens,
            bucket.cache_read_tokens,
            bucket.total_tokens(),
            cost,
            bucket.message_count,
            bucket.session_count()
        );
    }

    out
}

/// Quote a field only when it would otherwise break the row.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Sum every date's buckets per model, counting the days each model was used.
pub fn summarize_by_model(usage: &UsageMap) -> Vec<ModelTotals> {
    let mut by_model: BTreeMap<&str, (ModelTotals, BTreeSet<&str>)> = BTreeMap::new();

    for (key, bucket) in usage {
        let (totals, days) = by_model
            .entry(key.model.as_str())
            .or_insert_with(|| (ModelTotals::default(), BTreeSet::new()));
        totals.input_tokens = totals.input_tokens.saturating_add(bucket.input_tokens);
        totals.output_tokens = totals.output_tokens.saturating_add(bucket.output_tokens);
        totals.cache_creation_tokens = totals
            .cache_creation_tokens
            .saturating_add(bucket.cache_creation_tokens);
        totals.cache_read_tokens = totals.cache_read_tokens.saturating_add(bucket.cache_read_tokens);
        totals.message_count = totals.message_count.saturating_add(bucket.message_count);
        days.insert(key.date.as_str());
    }

    by_model
        .into_iter()
        .map(|(model, (totals, days))| ModelTotals {
            model: model.to_string(),
            active_days: days.len(),
            ..totals
        })
        .collect()
}

/// Render the all-time per-model summary with a grand-total row.
pub fn render_summary(usage: &UsageMap) -> String {
    let mut out = String::new();
    let rule = "=".repeat(SUMMARY_WIDTH);
    let sep = "-".repeat(SUMMARY_WIDTH);

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "  {}", SUMMARY_TITLE);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "Model", "Input", "Output", "C.Create", "C.Read", "Total", "Cost", "Days"
    );
    let _ = writeln!(out, "{}", sep);

    let mut total_tokens = 0u64;
    let mut total_cost = 0.0f64;

    for totals in summarize_by_model(usage) {
        let cost = calculate_cost(&totals.model, &totals);
        total_tokens = total_tokens.saturating_add(totals.total_tokens());
        total_cost += cost;

        let _ = writeln!(
            out,
            "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
            totals.model,
            format_tokens(totals.input_tokens),
            format_tokens(totals.output_tokens),
            format_tokens(totals.cache_creation_tokens),
            format_tokens(totals.cache_read_tokens),
            format_tokens(totals.total_tokens()),
            format_cost(cost),
            totals.active_days
        );
    }

    let _ = writeln!(out, "{}", sep);
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "TOTAL",
        "",
        "",
        "",
        "",
        format_tokens(total_tokens),
        format_cost(total_cost)
    );
    let _ = writeln!(out, "{}\n", rule);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::types::AggregateKey;

    fn bucket(input: u64, output: u64, sessions: &[&str]) -> AggregateBucket {
        AggregateBucket {
            input_tokens: input,
            output_tokens: output,
            message_count: sessions.len() as u64,
            session_ids: sessions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn two_model_day() -> UsageMap {
        let mut usage = UsageMap::new();
        usage.insert(AggregateKey::new("2024-01-01", "sonnet-4"), bucket(1000, 500, &["a"]));
        usage.insert(AggregateKey::new("2024-01-01", "opus-4.1"), bucket(2000, 1000, &["b"]));
        usage
    }

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(0), "0");
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(1_000), "1.0K");
        assert_eq!(format_tokens(4_500), "4.5K");
        assert_eq!(format_tokens(2_500_000), "2.5M");
        assert_eq!(format_tokens(1_234_567_890), "1.23B");
    }

    #[test]
    fn test_summary_scenario() {
        let usage = two_model_day();
        let models = summarize_by_model(&usage);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].model, "opus-4.1");
        assert_eq!(models[1].model, "sonnet-4");
        assert!(models.iter().all(|m| m.message_count == 1 && m.active_days == 1));

        let opus_cost = calculate_cost("opus-4.1", &models[0]);
        let sonnet_cost = calculate_cost("sonnet-4", &models[1]);
        assert!((opus_cost - 0.105).abs() < 1e-12);
        assert!((sonnet_cost - 0.0105).abs() < 1e-12);

        let total: u64 = models.iter().map(|m| m.total_tokens()).sum();
        assert_eq!(total, 4500);

        let rendered = render_summary(&usage);
        assert!(rendered.contains("Model Summary (all time)"));
        assert!(rendered.contains("opus-4.1"));
        assert!(rendered.contains("sonnet-4"));
        let total_line = rendered.lines().find(|l| l.starts_with("TOTAL")).unwrap();
        assert!(total_line.contains("4.5K"));
        assert!(total_line.contains("$0.12"));
    }

    #[test]
    fn test_table_day_subtotal_and_grand_total() {
        let usage = two_model_day();
        let table = render_table(&usage);
        let lines: Vec<&str> = table.lines().collect();

        let opus_row = lines.iter().position(|l| l.contains("opus-4.1")).unwrap();
        let sonnet_row = lines.iter().position(|l| l.contains("sonnet-4")).unwrap();
        assert!(opus_row < sonnet_row);

        let day_total = lines.iter().find(|l| l.contains("[day total]")).unwrap();
        assert!(day_total.starts_with("............"));
        assert!(day_total.contains("4.5K"));
        assert!(day_total.contains("$0.12"));

        let grand = lines.iter().find(|l| l.starts_with("TOTAL")).unwrap();
        assert!(grand.contains("3.0K"));
        assert!(grand.contains("1.5K"));
        assert!(grand.contains("4.5K"));
        assert!(grand.trim_end().ends_with('2'));
    }

    #[test]
    fn test_table_single_model_day_has_no_subtotal() {
        let mut usage = UsageMap::new();
        usage.insert(AggregateKey::new("2024-01-01", "sonnet-4"), bucket(10, 5, &["a"]));
        usage.insert(AggregateKey::new("2024-01-02", "sonnet-4"), bucket(20, 5, &["a"]));
        let table = render_table(&usage);
        assert!(!table.contains("[day total]"));
        assert!(table.contains("2024-01-01"));
        assert!(table.contains("2024-01-02"));
        let first = table.find("2024-01-01").unwrap();
        let second = table.find("2024-01-02").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(render_table(&UsageMap::new()), "No data found.\n");
    }

    #[test]
    fn test_csv_rows_are_exact() {
        let mut usage = two_model_day();
        usage.insert(
            AggregateKey::new("2023-12-31", "haiku-4.5"),
            AggregateBucket {
                input_tokens: 1_234_567,
                cache_read_tokens: 8,
                message_count: 3,
                session_ids: ["x".to_string()].into_iter().collect(),
                ..Default::default()
            },
        );

        let csv = render_csv(&usage);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "2023-12-31,haiku-4.5,1234567,0,0,8,1234575,0.99,3,1");
        assert!(lines[2].starts_with("2024-01-01,opus-4.1,2000,1000,0,0,3000,"));
        assert!(lines[2].ends_with(",1,1"));
        assert_eq!(lines[3], "2024-01-01,sonnet-4,1000,500,0,0,1500,0.01,1,1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_csv_empty_is_header_only() {
        assert_eq!(render_csv(&UsageMap::new()), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let mut usage = UsageMap::new();
        usage.insert(AggregateKey::new("2024-01-01", "gpt-5"), bucket(5_000_000, 5_000_000, &["a"]));
        let csv = render_csv(&usage);
        assert!(csv.contains("2024-01-01,gpt-5,5000000,5000000,0,0,10000000,0.00,1,1"));
    }

    #[test]
    fn test_summary_agrees_with_csv_and_table() {
        let mut usage = UsageMap::new();
        usage.insert(AggregateKey::new("2024-01-01", "sonnet-4"), bucket(1, 2, &["a"]));
        usage.insert(AggregateKey::new("2024-01-02", "sonnet-4"), bucket(30, 40, &["a", "b"]));
        usage.insert(AggregateKey::new("2024-01-02", "opus-4.6"), bucket(500, 600, &["c"]));

        let mut from_csv: BTreeMap<String, (u64, u64, u64)> = BTreeMap::new();
        for line in render_csv(&usage).lines().skip(1) {
            let cols: Vec<&str> = line.split(',').collect();
            let entry = from_csv.entry(cols[1].to_string()).or_default();
            entry.0 += cols[2].parse::<u64>().unwrap();
            entry.1 += cols[3].parse::<u64>().unwrap();
            entry.2 += cols[8].parse::<u64>().unwrap();
        }

        let summary = summarize_by_model(&usage);
        assert_eq!(summary.len(), from_csv.len());
        for totals in &summary {
            let (input, output, messages) = from_csv[&totals.model];
            assert_eq!(totals.input_tokens, input);
            assert_eq!(totals.output_tokens, output);
            assert_eq!(totals.message_count, messages);
        }
        let sonnet = summary.iter().find(|m| m.model == "sonnet-4").unwrap();
        assert_eq!(sonnet.active_days, 2);

        let table = render_table(&usage);
        let grand = table.lines().find(|l| l.starts_with("TOTAL")).unwrap();
        let table_messages: u64 = grand.split_whitespace().last().unwrap().parse().unwrap();
        let summary_messages: u64 = summary.iter().map(|m| m.message_count).sum();
        assert_eq!(table_messages, summary_messages);
        assert_eq!(table_messages, 4);

        let summary_tokens: u64 = summary.iter().map(|m| m.total_tokens()).sum();
        assert_eq!(summary_tokens, 1173);
        assert!(grand.contains(&format_tokens(summary_tokens)));
    }

    #[test]
    fn test_grand_totals_saturate() {
        let mut usage = UsageMap::new();
        usage.insert(AggregateKey::new("2024-01-01", "sonnet-4"), bucket(u64::MAX - 1, 0, &["a"]));
        usage.insert(AggregateKey::new("2024-01-02", "sonnet-4"), bucket(u64::MAX - 1, 0, &["a"]));

        let table = render_table(&usage);
        assert!(table.lines().any(|l| l.starts_with("TOTAL")));

        let summary = summarize_by_model(&usage);
        assert_eq!(summary[0].input_tokens, u64::MAX);
        assert_eq!(summary[0].total_tokens(), u64::MAX);
        assert!(render_summary(&usage).contains("TOTAL"));
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
