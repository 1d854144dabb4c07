use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    StatusCode,
};
use sigcraft_types::{RateLimitInfo, WireRevision};
use std::{
    fmt,
    sync::{Mutex, RwLock},
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{EngineKind, HashEngine, HashJob, HashOutcome};
use crate::{
    wire::{decode_response, encode_request},
    ConfigError, Result,
};

const AUTH_TOKEN: &str = "x-authtoken";
const MAX_REQUEST_COUNT: &str = "x-maxrequestcount";
const RATE_LIMIT_SECONDS: &str = "x-ratelimitseconds";
const RATE_PERIOD_END: &str = "x-rateperiodend";
const REQUESTS_REMAINING: &str = "x-raterequestsremaining";
const TOKEN_EXPIRATION: &str = "x-authtokenexpiration";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashServerErrorKind {
    BadRequest,
    Unauthorized,
    RateLimited,
    Other,
}

/// Non-success response from the hashing server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hashing server returned {status} ({kind:?}): {body}")]
pub struct HashServerError {
    pub kind: HashServerErrorKind,
    pub status: u16,
    pub body: String,
    /// Quota state reported alongside the failure.
    pub rate_limit: RateLimitInfo,
}

impl HashServerError {
    pub fn is_retriable(&self) -> bool {
        self.kind == HashServerErrorKind::RateLimited
    }
}

fn error_kind(status: StatusCode) -> HashServerErrorKind {
    match status {
        StatusCode::BAD_REQUEST => HashServerErrorKind::BadRequest,
        StatusCode::UNAUTHORIZED => HashServerErrorKind::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => HashServerErrorKind::RateLimited,
        _ => HashServerErrorKind::Other,
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn rate_limit_from_headers(headers: &HeaderMap) -> RateLimitInfo {
    RateLimitInfo {
        max_request_count: header_u64(headers, MAX_REQUEST_COUNT),
        rate_limit_seconds: header_u64(headers, RATE_LIMIT_SECONDS),
        period_end: header_u64(headers, RATE_PERIOD_END),
        requests_remaining: header_u64(headers, REQUESTS_REMAINING),
        token_expiration: header_u64(headers, TOKEN_EXPIRATION),
    }
}

/// Hash engine backed by a hashing server.
///
/// The key and the latest rate-limit snapshot belong to this instance, so
/// builders configured with different servers never share state.
pub struct RemoteHashClient {
    http: reqwest::Client,
    url: Url,
    wire: WireRevision,
    key: RwLock<String>,
    rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl fmt::Debug for RemoteHashClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHashClient")
            .field("url", &self.url.as_str())
            .field("wire", &self.wire)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl RemoteHashClient {
    /// Client for `{endpoint}/api/{api}/hash`.
    pub fn new(
        endpoint: &Url,
        key: impl Into<String>,
        api: &str,
        wire: WireRevision,
        timeout: Duration,
    ) -> Result<Self> {
        let mut base = endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base
            .join(&format!("api/{api}/hash"))
            .map_err(|_| ConfigError::InvalidUrl {
                field: "hashing_endpoint",
                value: endpoint.to_string(),
            })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            url,
            wire,
            key: RwLock::new(key.into()),
            rate_limit: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Most recent quota state, `None` before the first response.
    pub fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        self.rate_limit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn current_key(&self) -> String {
        self.key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_response(&self, headers: &HeaderMap) -> RateLimitInfo {
        let info = rate_limit_from_headers(headers);
        *self
            .rate_limit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(info.clone());

        let rotated = headers
            .get(AUTH_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(rotated) = rotated {
            let mut key = self
                .key
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *key != rotated {
                debug!("hashing key rotated by server");
                *key = rotated.to_string();
            }
        }
        info
    }

    /// One round trip: location hashes plus one hash per request.
    pub async fn hash(&self, job: &HashJob) -> Result<HashOutcome> {
        let body = encode_request(job, self.wire)?;
        debug!(
            url = %self.url,
            requests = job.requests.len(),
            wire = ?self.wire,
            "requesting hashes"
        );

        let response = self
            .http
            .post(self.url.clone())
            .header("X-AuthToken", self.current_key())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let rate_limit = self.record_response(response.headers());
        let text = response.text().await?;

        if status == StatusCode::OK {
            debug!(
                remaining = ?rate_limit.requests_remaining,
                "received hashes"
            );
            return Ok(decode_response(&text, job.requests.len())?);
        }

        let kind = error_kind(status);
        match kind {
            HashServerErrorKind::RateLimited => warn!(
                period_end = ?rate_limit.period_end,
                "hashing server rate limit reached"
            ),
            _ => warn!(status = status.as_u16(), ?kind, body = %text, "hashing server error"),
        }
        Err(HashServerError {
            kind,
            status: status.as_u16(),
            body: text,
            rate_limit,
        }
        .into())
    }
}

#[async_trait]
impl HashEngine for RemoteHashClient {
    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    async fn compute(&self, job: &HashJob) -> Result<HashOutcome> {
        self.hash(job).await
    }
}
