use std::time::Duration;

use futures_util::StreamExt;
use jobboard_core::{JobListing, DEFAULT_PAGE_SIZE};
use jobboard_logging::board_debug;
use url::Url;

use crate::{decode_feed, FailureKind, FeedError};

pub const DEFAULT_FEED_URL: &str = "https://remotive.com/api/remote-jobs";

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub page_size: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Source of job listings that answers "the first `limit` listings".
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_jobs(&self, limit: usize) -> Result<Vec<JobListing>, FeedError>;
}

/// `GET <base>?limit=<N>` against a JSON endpoint with a `jobs` array.
#[derive(Debug, Clone)]
pub struct ReqwestFeedSource {
    settings: FeedSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestFeedSource {
    pub fn new(settings: FeedSettings) -> Result<Self, FeedError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| FeedError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FeedError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    fn request_url(&self, limit: usize) -> Url {
        let mut url = self.base_url.clone();
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "limit")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("limit", &limit.to_string());
        }
        url
    }
}

#[async_trait::async_trait]
impl FeedSource for ReqwestFeedSource {
    async fn fetch_jobs(&self, limit: usize) -> Result<Vec<JobListing>, FeedError> {
        let url = self.request_url(limit);
        board_debug!("Fetching job feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        let listings = decode_feed(&body)?;
        board_debug!("Decoded {} listings (limit {})", listings.len(), limit);
        Ok(listings)
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FeedError {
    FeedError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        return FeedError::new(FailureKind::Timeout, err.to_string());
    }
    FeedError::new(FailureKind::Network, err.to_string())
}
