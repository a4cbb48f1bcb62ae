pub mod query;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::internal::context::RequestContext;
use crate::internal::endpoint::{BuilderKind, Route};
use crate::internal::models::{FeedContentEntry, FeedItem, FollowRecord, TagRecord, VideoRecord};

/// Transport knobs for the gateway. Every request gets a hard timeout and
/// failed requests are retried with capped exponential backoff, so the
/// single-flight guard is always released eventually.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

/// Outcome of one page fetch.
#[derive(Debug)]
pub enum PageFetch {
    Page(Vec<FeedItem>),
    /// The container's params carry a search marker; paging does not apply.
    Skipped,
}

#[derive(Debug, Deserialize)]
struct FeedContentPayload {
    #[serde(default)]
    result: Vec<FeedContentEntry>,
}

/// HTTP gateway for the pagination endpoints.
///
/// Decodes wire payloads into [`FeedItem`]s at this boundary and returns
/// `anyhow::Result` with contextualized errors so callers keep the
/// diagnostic trail.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
    opts: FetchOptions,
}

impl FeedClient {
    pub fn new(base_url: &str, opts: FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(opts.timeout)
            .cookie_store(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: None,
            opts,
        })
    }

    /// Token forwarded on feed search requests, usually read from the
    /// page's csrf-token meta tag.
    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    /// Fetch one page for the route. The caller owns the cursor; this
    /// method never mutates pagination state.
    pub async fn fetch_page(
        &self,
        route: &Route,
        ctx: &RequestContext,
        page: u32,
    ) -> Result<PageFetch> {
        match route.builder {
            BuilderKind::Article => {
                let url = format!(
                    "{}{}?{}",
                    self.base_url,
                    route.path,
                    query::feed_search_query(ctx, page)
                );
                let payload: FeedContentPayload = self.get_json(&url, true).await?;
                Ok(PageFetch::Page(
                    payload.result.into_iter().map(FeedItem::from).collect(),
                ))
            }
            BuilderKind::Video => match self.listing_url(route, ctx, page) {
                None => Ok(PageFetch::Skipped),
                Some(url) => {
                    let records: Vec<VideoRecord> = self.get_json(&url, false).await?;
                    Ok(PageFetch::Page(
                        records.into_iter().map(FeedItem::Video).collect(),
                    ))
                }
            },
            BuilderKind::Follow => match self.listing_url(route, ctx, page) {
                None => Ok(PageFetch::Skipped),
                Some(url) => {
                    let records: Vec<FollowRecord> = self.get_json(&url, false).await?;
                    Ok(PageFetch::Page(
                        records.into_iter().map(FeedItem::Follow).collect(),
                    ))
                }
            },
            BuilderKind::Tag => match self.listing_url(route, ctx, page) {
                None => Ok(PageFetch::Skipped),
                Some(url) => {
                    let records: Vec<TagRecord> = self.get_json(&url, false).await?;
                    Ok(PageFetch::Page(
                        records.into_iter().map(FeedItem::Tag).collect(),
                    ))
                }
            },
        }
    }

    fn listing_url(&self, route: &Route, ctx: &RequestContext, page: u32) -> Option<String> {
        query::listing_query(&ctx.params, page, query::cache_bust_signature())
            .map(|qs| format!("{}{}?{}", self.base_url, route.path, qs))
    }

    async fn get_json<T>(&self, url: &str, json_headers: bool) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0u32;
        let attempts = self.opts.max_retries.max(1);
        loop {
            match self.try_get(url, json_headers).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "page request failed, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.opts.backoff_base * (1u32 << attempt.min(4))
    }

    async fn try_get<T>(&self, url: &str, json_headers: bool) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self.client.get(url);
        if json_headers {
            request = request
                .header(reqwest::header::ACCEPT, "application/json")
                .header(reqwest::header::CONTENT_TYPE, "application/json");
            if let Some(token) = &self.csrf_token {
                request = request.header("X-CSRF-Token", token);
            }
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to send GET request to {url}"))?
            .error_for_status()
            .with_context(|| format!("server rejected GET {url}"))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to parse JSON response from {url}"))
    }
}
