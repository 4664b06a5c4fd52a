//! Canonical volume title sources
//!
//! Two sources are consulted in priority order: the structured CEUR-WS
//! metadata service and the CEUR-WS volume page itself. Both are rate limited
//! per client and share the configured request timeout.

use crate::error::{LinkError, LinkResult};
use async_trait::async_trait;
use eventseries_common::config::{get_user_agent, CompletionConfig};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

static VOLTITLE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span[^>]*class="CEURVOLTITLE"[^>]*>(.*?)</span>"#)
        .expect("volume title pattern is valid")
});
static INNER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Looks up the published title of a CEUR-WS volume
#[async_trait]
pub trait VolumeTitleSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the source has no title for the volume;
    /// `Err(ExternalLookup)` when the source could not be asked
    async fn volume_title(&self, volume_number: u32) -> LinkResult<Option<String>>;
}

fn build_http_client(config: &CompletionConfig) -> LinkResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(get_user_agent())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| LinkError::Other(anyhow::Error::new(e).context("Failed to build HTTP client")))
}

fn build_rate_limiter(requests_per_second: u32) -> DirectRateLimiter {
    let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(per_second))
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `cvb.voltitle`, else `cvb.title`
pub fn title_from_metadata(metadata: &Value) -> Option<String> {
    non_empty(metadata.get("cvb.voltitle")).or_else(|| non_empty(metadata.get("cvb.title")))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Text of the `CEURVOLTITLE` span of a volume page
pub fn title_from_volume_page(html: &str) -> Option<String> {
    let captures = VOLTITLE_SPAN.captures(html)?;
    let without_tags = INNER_TAG.replace_all(&captures[1], "");
    let text = decode_entities(&without_tags);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Structured CEUR-WS volume metadata (`<base>/Vol-<n>.json`)
pub struct CeurSptClient {
    client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    base_url: String,
}

impl CeurSptClient {
    pub const NAME: &'static str = "ceurspt";

    pub fn new(config: &CompletionConfig) -> LinkResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            rate_limiter: build_rate_limiter(config.requests_per_second),
            base_url: config.ceurspt_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VolumeTitleSource for CeurSptClient {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn volume_title(&self, volume_number: u32) -> LinkResult<Option<String>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/Vol-{}.json", self.base_url, volume_number);
        debug!(url = %url, "Requesting volume metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LinkError::external(Self::NAME, e))?;

        if !response.status().is_success() {
            return Err(LinkError::external(
                Self::NAME,
                format!("status {} for volume {}", response.status(), volume_number),
            ));
        }

        let metadata: Value = response
            .json()
            .await
            .map_err(|e| LinkError::external(Self::NAME, e))?;
        Ok(title_from_metadata(&metadata))
    }
}

/// Scrapes the CEUR-WS volume page (`<base>/Vol-<n>/`)
pub struct CeurWsScraper {
    client: reqwest::Client,
    rate_limiter: DirectRateLimiter,
    base_url: String,
}

impl CeurWsScraper {
    pub const NAME: &'static str = "ceur-ws.org";

    pub fn new(config: &CompletionConfig) -> LinkResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            rate_limiter: build_rate_limiter(config.requests_per_second),
            base_url: config.ceurws_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VolumeTitleSource for CeurWsScraper {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn volume_title(&self, volume_number: u32) -> LinkResult<Option<String>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/Vol-{}/", self.base_url, volume_number);
        debug!(url = %url, "Requesting volume page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LinkError::external(Self::NAME, e))?;

        if !response.status().is_success() {
            return Err(LinkError::external(
                Self::NAME,
                format!("status {} for volume {}", response.status(), volume_number),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| LinkError::external(Self::NAME, e))?;
        Ok(title_from_volume_page(&html))
    }
}
