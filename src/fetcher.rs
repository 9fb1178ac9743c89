use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::settings::Settings;
use crate::prompt::truncate_chars;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF_MS: u64 = 1000;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("could not fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Source of a portfolio page's visible text.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Plain HTTP GET with a browser user agent, HTML reduced to text.
pub struct HttpFetcher {
    client: reqwest::Client,
    char_limit: usize,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher {
            client,
            char_limit: settings.page_char_limit,
        })
    }

    async fn get_once(&self, url: &str) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_UA)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        let (status, html) = loop {
            let result = self.get_once(url).await;
            let retry = match &result {
                Ok((status, _)) => should_retry(*status),
                Err(e) => e.is_timeout() || e.is_connect(),
            };
            if !retry || attempt == MAX_RETRIES {
                break result.map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            }

            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
            warn!(
                "Fetch of {} failed (attempt {}/{}), backing off {:.1}s",
                url,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        };

        if !status.is_success() {
            warn!("{} answered {}, using its body anyway", url, status);
        }

        let text = extract_text(&html);
        let capped = truncate_chars(&text, self.char_limit);
        info!(
            "Fetched {} ({} chars of text, {} kept)",
            url,
            text.chars().count(),
            capped.chars().count()
        );
        Ok(capped.to_string())
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Drop `<script>`/`<style>` blocks and all tags, collapse whitespace.
pub fn extract_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let without_styles = STYLE_RE.replace_all(&without_scripts, "");
    let text = TAG_RE.replace_all(&without_styles, " ");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_styles_and_tags() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script type="text/javascript">var x = "<b>nope</b>";</script></head>
            <body><h1>My   Portfolio</h1><p>Built with <b>React</b></p></body></html>"#;
        assert_eq!(extract_text(html), "My Portfolio Built with React");
    }

    #[test]
    fn multiline_and_uppercase_blocks() {
        let html = "<SCRIPT>\nalert(1)\n</SCRIPT>\n<Style>\n.a{}\n</Style>text";
        assert_eq!(extract_text(html), "text");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(extract_text("  hello \n\n world "), "hello world");
        assert_eq!(extract_text(""), "");
    }

    #[test]
    fn portfolio_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/portfolio.html").unwrap();
        let text = extract_text(&html);
        assert!(text.contains("Weather Dashboard"));
        assert!(!text.contains("gtag"));
        assert!(!text.contains('<'));
        assert!(!text.contains("\n"));
    }

    #[test]
    fn retry_policy() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(!should_retry(StatusCode::NOT_FOUND));
        assert!(!should_retry(StatusCode::OK));
    }
}
