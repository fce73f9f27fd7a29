//! Fortune-of-the-day source.
//!
//! Fortunes are scraped from numbered pages of a fortune cookie site. Some
//! pages carry no fortune; those count as a failed attempt and another page
//! is tried, up to a fixed number of attempts.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::config::FortuneSettings;
use crate::providers::{ProviderError, Result};

/// Trait for fortune sources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FortuneSource: Send + Sync {
    /// Fetches one fortune as plain text.
    async fn fetch(&self) -> Result<String>;
}

fn fortune_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("div.fortune").expect("invalid fortune selector"))
}

/// Returns the text of the first `div.fortune` element, tags stripped.
pub fn extract_fortune(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let fortune = doc.select(fortune_selector()).next()?;
    let text = fortune.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Page number for the given attempt, in `1..=max_page`.
fn page_number(seed: u64, attempt: u32, max_page: u32) -> u32 {
    let max_page = u64::from(max_page.max(1));
    let mixed = seed.wrapping_add(u64::from(attempt).wrapping_mul(7919));
    (mixed % max_page) as u32 + 1
}

/// HTTP client for the fortune cookie site.
pub struct FortuneCookieClient {
    client: reqwest::Client,
    base_url: Url,
    max_page: u32,
    max_attempts: u32,
}

impl FortuneCookieClient {
    /// Creates a client from settings.
    pub fn new(settings: &FortuneSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            ProviderError::InvalidRequest(format!("bad fortune url {}: {}", settings.base_url, e))
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            max_page: settings.max_page,
            max_attempts: settings.max_attempts.max(1),
        })
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&page.to_string())
            .push("");
        Ok(url)
    }

    async fn fetch_page(&self, page: u32) -> Result<Option<String>> {
        let response = self.client.get(self.page_url(page)?).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        let html = response.text().await?;
        Ok(extract_fortune(&html))
    }
}

#[async_trait]
impl FortuneSource for FortuneCookieClient {
    async fn fetch(&self) -> Result<String> {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            let page = page_number(seed, attempt, self.max_page);
            match self.fetch_page(page).await {
                Ok(Some(fortune)) => {
                    tracing::debug!(page, "Got fortune");
                    return Ok(fortune);
                }
                Ok(None) => {
                    tracing::debug!(page, "Page has no fortune, trying another");
                }
                Err(e) => {
                    tracing::debug!(page, error = %e, "Fortune page fetch failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::NotFound(format!(
                "no fortune after {} attempts",
                self.max_attempts
            ))
        }))
    }
}
