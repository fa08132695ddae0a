use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::Article;

static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::compile);

struct Patterns {
    title: Regex,
    og_title: Regex,
    description: Regex,
    video_title: Regex,
    body: Regex,
    tag: Regex,
    author: Regex,
    author_link: Regex,
    image: Regex,
    entity: Regex,
}

impl Patterns {
    fn compile() -> Self {
        Self {
            title: pattern(r#"msg_title = window\.title = ['"]([^'"]+)['"]"#),
            og_title: pattern(r#"property="og:title" content="([^"]+)""#),
            description: pattern(r#"name="description" content="([^"]+)""#),
            video_title: pattern(r#"<h1[^>]*id="js_video_page_title""#),
            body: pattern(r#"(?s)id="js_content"[^>]*>(.*?)</div>\s*</div>\s*</div>"#),
            tag: pattern(r"<[^>]+>"),
            author: pattern(r#"nick_name: JsDecode\(['"]([^'"]+)['"]\)"#),
            author_link: pattern(r#"class="account_nickname_inner">([^<]+)<"#),
            // Also matches inside data-src="..."
            image: pattern(r#"src="(https://mmbiz\.qpic\.cn[^"]+)""#),
            entity: pattern(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);"),
        }
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("extraction patterns are valid")
}

/// Extract article fields from a fetched page.
///
/// Missing fields stay empty. Video articles, and pages whose body block
/// cannot be located, use the description as their content.
pub fn parse_article(url: &str, html: &str) -> Article {
    let p = &*PATTERNS;

    let title = first_capture(&p.title, html)
        .map(|t| decode_entities(&p.entity, &t.replace("&amp;", "&")))
        .or_else(|| first_capture(&p.og_title, html).map(|t| decode_entities(&p.entity, &t)))
        .unwrap_or_default();

    let description = first_capture(&p.description, html)
        .map(|d| {
            let d = d
                .replace("\\x0a", "\n")
                .replace("\\x26", "&")
                .replace("&amp;", "&");
            decode_entities(&p.entity, &d)
        })
        .unwrap_or_default();

    let is_video = p.video_title.is_match(html);

    let content = if is_video {
        description.clone()
    } else {
        match first_capture(&p.body, html) {
            Some(inner) => body_text(p, &inner),
            None => description.clone(),
        }
    };

    let author = first_capture(&p.author, html)
        .or_else(|| first_capture(&p.author_link, html).map(|a| a.trim().to_string()))
        .unwrap_or_default();

    let images: BTreeSet<String> = p
        .image
        .captures_iter(html)
        .map(|c| c[1].replace("&amp;", "&"))
        .collect();

    Article {
        url: url.to_string(),
        title,
        author,
        description,
        content,
        images: images.into_iter().collect(),
        is_video,
        raw_html_length: html.len(),
    }
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack).map(|c| c[1].to_string())
}

/// Strip tags and collapse the body to non-blank trimmed lines.
fn body_text(p: &Patterns, inner: &str) -> String {
    let text = p.tag.replace_all(inner, "\n");
    let text = decode_entities(&p.entity, &text);
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode named and numeric HTML character references. Unknown names are
/// left as written.
fn decode_entities(entity: &Regex, text: &str) -> String {
    entity
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "middot" => '·',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "copy" => '©',
        _ => return None,
    };
    Some(c)
}
