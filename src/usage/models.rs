/// Raw model identifiers with a hand-picked short name.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-opus-4-6-20260205", "opus-4.6"),
    ("claude-opus-4-5-20251101", "opus-4.5"),
    ("claude-opus-4-1-20250501", "opus-4.1"),
    ("claude-sonnet-4-5-20250929", "sonnet-4.5"),
    ("claude-sonnet-4-20250514", "sonnet-4"),
    ("claude-haiku-4-5-20251001", "haiku-4.5"),
];

/// Stripped in order, so "anthropic/claude-x" becomes "x".
const VENDOR_PREFIXES: &[&str] = &["anthropic/", "claude-"];

/// Length of a trailing `YYYYMMDD` release stamp.
const DATE_SUFFIX_LEN: usize = 8;

/// Map a raw model identifier to the canonical short name used for grouping
/// and pricing.
///
/// Unknown identifiers lose their vendor prefix and any trailing 8-digit date
/// stamp. Never fails, and never returns an empty string for non-empty input.
pub fn canonical_model_name(model_id: &str) -> String {
    if let Some((_, short)) = MODEL_ALIASES.iter().find(|(raw, _)| *raw == model_id) {
        return (*short).to_string();
    }

    let mut name = model_id;
    for prefix in VENDOR_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }

    if let Some((head, tail)) = name.rsplit_once('-') {
        if is_date_stamp(tail) && !head.is_empty() {
            return head.to_string();
        }
    }

    if name.is_empty() {
        return model_id.trim().to_string();
    }

    name.to_string()
}

fn is_date_stamp(segment: &str) -> bool {
    segment.len() == DATE_SUFFIX_LEN && segment.bytes().all(|b| b.is_ascii_digit())
}
