use anyhow::{Context, Result};
use chrono::Local;

use crate::article::{fetch_article, fetch_many, render_batch, render_markdown, render_summary};
use crate::cli::ArticleFormat;

/// Fetch one or more articles and print them in the requested format
pub async fn run(urls: Vec<String>, format: ArticleFormat) -> Result<()> {
    let urls: Vec<String> = urls
        .into_iter()
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .collect();

    if urls.is_empty() {
        anyhow::bail!("Provide at least one article link (http:// or https://)");
    }

    if let [url] = urls.as_slice() {
        let article = fetch_article(url)
            .await
            .with_context(|| format!("Failed to fetch article: {}", url))?;

        match format {
            ArticleFormat::Json => println!("{}", serde_json::to_string_pretty(&article)?),
            ArticleFormat::Markdown => print!("{}", render_markdown(&article, &Local::now())),
            ArticleFormat::Summary => print!("{}", render_summary(&article)),
        }
        return Ok(());
    }

    eprintln!("[cc-usage] Fetching {} articles...", urls.len());
    let entries = fetch_many(&urls).await;

    match format {
        ArticleFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        ArticleFormat::Markdown | ArticleFormat::Summary => print!("{}", render_batch(&entries)),
    }

    Ok(())
}
