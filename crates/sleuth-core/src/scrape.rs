//! Web scraping for research material
//!
//! Fetches pages over HTTP and reduces their HTML to plain text:
//! - `scrape_url` keeps every visible text node of a page
//! - `gather_topic` keeps only the paragraphs of a Wikipedia article

use crate::config::ScraperConfig;
use crate::error::{Result, SleuthError};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;

/// Elements whose text is never part of the readable page
const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// HTTP scraper for web pages and Wikipedia topics
pub struct WebScraper {
    client: Client,
    config: ScraperConfig,
}

impl WebScraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sleuth/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch a page and return its readable text, one phrase per line
    pub async fn scrape_url(&self, url: &str) -> Result<String> {
        let html = self.fetch(self.client.get(url), url).await?;
        let text = html_to_text(&html);
        tracing::debug!("Scraped {} characters from {}", text.len(), url);
        Ok(text)
    }

    /// Fetch the Wikipedia article for `topic` and return its paragraphs
    pub async fn gather_topic(&self, topic: &str) -> Result<String> {
        let url = self.topic_url(topic);
        let request = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.config.user_agent);
        let html = self.fetch(request, &url).await?;
        Ok(paragraph_text(&html))
    }

    /// Article URL for a topic; spaces become underscores as in Wikipedia titles
    pub fn topic_url(&self, topic: &str) -> String {
        format!(
            "{}/{}",
            self.config.wikipedia_url.trim_end_matches('/'),
            topic.trim().replace(' ', "_")
        )
    }

    async fn fetch(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SleuthError::scrape(url, "request timed out")
            } else if e.is_connect() {
                SleuthError::scrape(url, "cannot reach server")
            } else {
                SleuthError::scrape(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status {
                StatusCode::NOT_FOUND => "page not found (404)".to_string(),
                StatusCode::FORBIDDEN => "access forbidden (403)".to_string(),
                StatusCode::TOO_MANY_REQUESTS => "rate limited (429)".to_string(),
                s => format!(
                    "HTTP error {} {}",
                    s.as_u16(),
                    s.canonical_reason().unwrap_or("Unknown error")
                ),
            };
            return Err(SleuthError::scrape(url, reason));
        }

        response
            .text()
            .await
            .map_err(|e| SleuthError::scrape(url, format!("failed to read body: {}", e)))
    }
}

/// Reduce an HTML document to its visible text
///
/// Text inside `<script>` and `<style>` is dropped; the rest is concatenated
/// in document order and passed through [`clean_text`].
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    clean_text(&raw)
}

/// Text of every `<p>` element, joined by single spaces
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim every line, break lines apart at double spaces and drop empty phrases
pub fn clean_text(text: &str) -> String {
    text.split(is_line_break)
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_splits_double_spaces() {
        let raw = "  Title  \n\n   First phrase  Second phrase\r\nlast ";
        assert_eq!(clean_text(raw), "Title\nFirst phrase\nSecond phrase\nlast");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text("   \n \n\t"), "");
    }

    #[test]
    fn test_html_to_text_drops_script_and_style() {
        let html = r#"<html><head><title>Page</title><style>body { color: red; }</style></head>
<body>
  <h1>Heading</h1>
  <script>var x = "hidden";</script>
  <p>Visible <b>bold</b> text.</p>
</body></html>"#;
        let text = html_to_text(html);
        assert!(text.contains("Heading"));
        assert!(text.contains("Visible bold text."));
        assert!(text.contains("Page"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_html_to_text_skips_comments() {
        let text = html_to_text("<body><!-- secret --><p>shown</p></body>");
        assert_eq!(text, "shown");
    }

    #[test]
    fn test_paragraph_text() {
        let html = "<body><h2>Skip</h2><p>One <a href='#'>link</a>.</p><div>no</div><p>Two.</p></body>";
        assert_eq!(paragraph_text(html), "One link. Two.");
    }

    #[test]
    fn test_topic_url() {
        let scraper = WebScraper::new(ScraperConfig {
            wikipedia_url: "https://en.wikipedia.org/wiki/".into(),
            ..ScraperConfig::default()
        })
        .unwrap();
        assert_eq!(
            scraper.topic_url("Artificial intelligence"),
            "https://en.wikipedia.org/wiki/Artificial_intelligence"
        );
    }

    #[tokio::test]
    async fn test_scrape_invalid_url() {
        let scraper = WebScraper::new(ScraperConfig::default()).unwrap();
        let result = scraper
            .scrape_url("http://thisurldoesnotexist12345.invalid")
            .await;
        assert!(matches!(result, Err(SleuthError::Scrape { .. })));
    }
}
