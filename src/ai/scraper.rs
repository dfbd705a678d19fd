use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>").expect("valid script regex"));
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page returned status {0}")]
    Status(u16),
}

/// Fetches pages and reduces them to visible text for prompting
#[derive(Clone)]
pub struct PageScraper {
    client: reqwest::Client,
}

impl PageScraper {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mixerai-api/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }
        let html = response.text().await?;
        Ok(html_to_text(&html))
    }
}

pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(html, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_scripts_and_entities() {
        let html = r#"<html><head><title>Shop</title><style>p{color:red}</style>
            <script type="text/javascript">var x = "<b>";</script></head>
            <body><!-- nav --><h1>Fresh  &amp; Tasty</h1><p>Buy&nbsp;now</p></body></html>"#;
        assert_eq!(html_to_text(html), "Shop Fresh & Tasty Buy now");
    }
}
