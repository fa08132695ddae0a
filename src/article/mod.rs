//! Fetch a WeChat public-account article and pull out its metadata.
//!
//! The page is requested once with a WeChat client User-Agent (plain browser
//! agents get an anti-crawler interstitial) and the fields are extracted with
//! regular expressions over the raw HTML.

mod extract;
mod render;

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub use extract::parse_article;
pub use render::{render_batch, render_markdown, render_summary};

pub const WECHAT_UA: &str = "Mozilla/5.0 (Linux; Android 13; V2148A) AppleWebKit/537.36 Chrome/116.0.0.0 Mobile Safari/537.36 MicroMessenger/8.0.49.2600 WeChat/arm64 Weixin NetType/WIFI Language/zh_CN";

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("empty response from {0}")]
    EmptyPage(String),
}

pub type Result<T> = std::result::Result<T, ArticleError>;

/// Metadata and body text of one article
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub content: String,
    pub images: Vec<String>,
    pub is_video: bool,
    pub raw_html_length: usize,
}

/// Outcome of one URL in a batch
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Fetched(Article),
    Failed { url: String, error: String },
}

/// Fetch one article page and extract its fields.
pub async fn fetch_article(url: &str) -> Result<Article> {
    let client = reqwest::Client::builder()
        .user_agent(WECHAT_UA)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;

    tracing::debug!(url, "fetching article");
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ArticleError::Status(response.status()));
    }

    let html = response.text().await?;
    if html.trim().is_empty() {
        return Err(ArticleError::EmptyPage(url.to_string()));
    }

    Ok(parse_article(url, &html))
}

/// Fetch several articles in order; a failure is recorded and the batch
/// continues.
pub async fn fetch_many(urls: &[String]) -> Vec<BatchEntry> {
    let mut entries = Vec::with_capacity(urls.len());
    for url in urls {
        match fetch_article(url).await {
            Ok(article) => entries.push(BatchEntry::Fetched(article)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "article fetch failed");
                entries.push(BatchEntry::Failed {
                    url: url.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head>
<meta property="og:title" content="Fallback title" />
<meta name="description" content="Short summary" />
</head><body>
<script>var msg_title = window.title = "Rust in Production";</script>
<div id="js_content" style="visibility:hidden"><p>First paragraph</p><p>Second</p></div>
</div>
</div>
<img data-src="https://mmbiz.qpic.cn/a.png?wx_fmt=png" />
<script>nick_name: JsDecode('Systems Weekly')</script>
</body></html>"#;

    #[tokio::test]
    async fn test_fetch_article_sends_wechat_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s/abc"))
            .and(header("user-agent", WECHAT_UA))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let url = format!("{}/s/abc", server.uri());
        let article = fetch_article(&url).await.unwrap();
        assert_eq!(article.url, url);
        assert_eq!(article.title, "Rust in Production");
        assert_eq!(article.author, "Systems Weekly");
        assert_eq!(article.content, "First paragraph\nSecond");
        assert_eq!(article.images, vec!["https://mmbiz.qpic.cn/a.png?wx_fmt=png"]);
        assert_eq!(article.raw_html_length, PAGE.len());
    }

    #[tokio::test]
    async fn test_fetch_article_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_article(&format!("{}/s/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleError::Status(s) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_fetch_article_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  "))
            .mount(&server)
            .await;

        let err = fetch_article(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ArticleError::EmptyPage(_)));
    }

    #[tokio::test]
    async fn test_fetch_many_continues_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/gone", server.uri()),
            format!("{}/ok", server.uri()),
        ];
        let entries = fetch_many(&urls).await;
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], BatchEntry::Failed { error, .. } if error.contains("500")));
        assert!(matches!(&entries[1], BatchEntry::Fetched(a) if a.title == "Rust in Production"));
    }
}
