use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};

use super::{Article, BatchEntry};

const RULE_WIDTH: usize = 50;
const MAX_LISTED_IMAGES: usize = 10;
const MAX_IMAGE_URL_CHARS: usize = 80;

fn kind(article: &Article) -> &'static str {
    if article.is_video {
        "Video article"
    } else {
        "Text article"
    }
}

/// Plain-text overview with the full body and the first image links.
pub fn render_summary(article: &Article) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Title:  {}", article.title);
    let _ = writeln!(out, "Author: {}", article.author);
    let _ = writeln!(out, "Type:   {}", kind(article));
    let _ = writeln!(out, "Images: {}", article.images.len());
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Content:");
    let _ = writeln!(out, "{}", article.content);
    let _ = writeln!(out, "{}", rule);

    if !article.images.is_empty() {
        let _ = writeln!(out, "Image links:");
        for (i, img) in article.images.iter().take(MAX_LISTED_IMAGES).enumerate() {
            let shown: String = img.chars().take(MAX_IMAGE_URL_CHARS).collect();
            let _ = writeln!(out, "  {}. {}...", i + 1, shown);
        }
        if article.images.len() > MAX_LISTED_IMAGES {
            let _ = writeln!(out, "  ... {} in total", article.images.len());
        }
        let _ = writeln!(out, "{}", rule);
    }

    out
}

/// Markdown note for archiving, with empty sections to fill in by hand.
pub fn render_markdown<Tz: TimeZone>(article: &Article, fetched_at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut md = String::new();

    let _ = writeln!(md, "# {}\n", article.title);
    let _ = writeln!(md, "## Details\n");
    let _ = writeln!(md, "| Field | Value |");
    let _ = writeln!(md, "|-------|-------|");
    let _ = writeln!(md, "| **Author** | {} |", article.author);
    let _ = writeln!(md, "| **Type** | {} |", kind(article));
    let _ = writeln!(md, "| **Images** | {} |", article.images.len());
    let _ = writeln!(md, "| **Source** | [original]({}) |", article.url);
    let _ = writeln!(md, "\n---\n");
    let _ = writeln!(md, "## Content\n");
    let _ = writeln!(md, "{}", article.content);
    let _ = writeln!(md, "\n---\n");
    let _ = writeln!(md, "## Images\n");

    if article.images.is_empty() {
        let _ = writeln!(md, "*No images*");
    } else {
        for (i, img) in article.images.iter().enumerate() {
            let _ = writeln!(md, "- Image {}: {}", i + 1, img);
        }
    }

    let _ = writeln!(md, "\n---\n");
    let _ = writeln!(md, "## Notes\n");
    let _ = writeln!(md, "### Key points\n1.\n2.\n3.\n");
    let _ = writeln!(md, "### Key facts\n-\n-\n");
    let _ = writeln!(md, "### Quotes\n> \"\"\n> \"\"\n");
    let _ = writeln!(md, "### Takeaways\n- What does this suggest for my own work?\n- What is worth borrowing?\n");
    let _ = writeln!(md, "---\n");
    let _ = writeln!(md, "*Fetched: {}*", fetched_at.format("%Y-%m-%d %H:%M"));

    md
}

/// One-line-per-article listing for a batch run.
pub fn render_batch(entries: &[BatchEntry]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "Fetched {} articles", entries.len());
    let _ = writeln!(out, "{}", rule);

    for (i, entry) in entries.iter().enumerate() {
        match entry {
            BatchEntry::Fetched(article) => {
                let _ = writeln!(out, "\nArticle {}: {}", i + 1, article.title);
                let _ = writeln!(out, "   Author: {}", article.author);
                let _ = writeln!(out, "   Images: {}", article.images.len());
            }
            BatchEntry::Failed { url, error } => {
                let _ = writeln!(out, "\nArticle {}: failed ({}) - {}", i + 1, url, error);
            }
        }
    }

    out
}
