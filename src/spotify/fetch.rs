use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Bounds applied to the 429 backoff loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Consecutive 429 responses tolerated for one call before giving up.
    pub max_retries: u32,
    /// Ceiling of the exponential part of the delay. `Retry-After` is always honoured.
    pub max_backoff: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: 30,
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RateLimitPolicy {
    /// Delay before retry number `attempt` (0 based).
    ///
    /// `Retry-After + 1` seconds (one second when the header is missing),
    /// raised to `2^attempt` seconds capped at `max_backoff`.
    pub fn delay(&self, retry_after: Option<u64>, attempt: u32) -> Duration {
        let requested = Duration::from_secs(retry_after.unwrap_or(1).saturating_add(1));
        let exponential = Duration::from_secs(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
            .min(self.max_backoff);

        requested.max(exponential)
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    /// Base64 encoded JPEG, sent as `image/jpeg`.
    Jpeg(String),
}

/// A replayable description of an outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn jpeg(mut self, base64: impl Into<String>) -> Self {
        self.body = Body::Jpeg(base64.into());
        self
    }
}

/// Sends catalog requests with a bearer token and absorbs `429 Too Many Requests`.
///
/// A rate limited call sleeps and is replayed unchanged; callers only ever
/// see success or a terminal failure.
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher {
    client: Client,
    access_token: String,
    policy: RateLimitPolicy,
}

impl RateLimitedFetcher {
    pub fn new(client: Client, access_token: String, policy: RateLimitPolicy) -> Self {
        Self {
            client,
            access_token,
            policy,
        }
    }

    /// Sends the request, retrying on 429. Any other status is returned as is.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            let response = self.build(request).send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if attempt >= self.policy.max_retries {
                return Err(Error::RateLimitExhausted {
                    url: request.url.clone(),
                    attempts: attempt + 1,
                });
            }

            let retry_after = parse_retry_after(response.headers());
            let delay = self.policy.delay(retry_after, attempt);
            tracing::warn!(
                url = %request.url,
                attempt,
                retry_after,
                delay_secs = delay.as_secs(),
                "rate limited, backing off"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Like [`send`](Self::send) but turns every non-2xx status into [`Error::UpstreamRequest`].
    pub async fn fetch(&self, request: &ApiRequest) -> Result<Response> {
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(Error::UpstreamRequest {
            status: status.as_u16(),
            url,
            body,
        })
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.fetch(request).await?;
        Ok(response.json::<T>().await?)
    }

    fn build(&self, request: &ApiRequest) -> RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .bearer_auth(&self.access_token);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Jpeg(data) => builder
                .header(header::CONTENT_TYPE, "image/jpeg")
                .body(data.clone()),
        }
    }
}

fn parse_retry_after(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
