//! Request gate: cache, rate limiting and retry/backoff around one HTTP call.
//!
//! Every outbound API call in the pipeline goes through [`RequestGate::execute`].
//! The cache is consulted before the rate limiter and before any retry
//! bookkeeping, so a cached run touches the network not at all.

use std::io;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::cache::RequestCache;
use crate::error::GateError;
use crate::http::{http_client, REQUEST_TIMEOUT, SHARED_RUNTIME};
use crate::limiter::RateLimiter;

/// Retry settings for the gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Retries after the initial attempt, so `max_retries = 3` means up to
    /// four attempts in total.
    pub max_retries: u32,
    /// Base backoff in seconds; the n-th retry sleeps `backoff_factor * n`.
    pub backoff_factor: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
        }
    }
}

/// Rate-limit tag: which source slot to pace on, and by how much.
#[derive(Debug, Clone)]
pub struct Pace {
    pub source: String,
    pub min_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Method {
    Get,
    Post,
}

/// One outbound request, built fluently.
#[derive(Debug, Clone)]
pub struct GateRequest {
    method: Method,
    url: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    pace: Option<Pace>,
}

impl GateRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            pace: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: Some(body),
            pace: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn paced(mut self, source: impl Into<String>, min_interval: Duration) -> Self {
        self.pace = Some(Pace {
            source: source.into(),
            min_interval,
        });
        self
    }
}

/// Failure of a single attempt, before retry policy is applied.
enum AttemptError {
    /// HTTP 429 — retried with an extended backoff.
    RateLimited,
    /// Unexpected 4xx/5xx.
    Status { code: u16, body: String },
    /// Timeout, connect failure, body read failure.
    Transport(String),
    /// 200 with a body that is not JSON.
    Malformed(String),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "HTTP 429: rate limited"),
            Self::Status { code, body } => write!(f, "HTTP {code}: {body}"),
            Self::Transport(msg) => write!(f, "request error: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed JSON: {msg}"),
        }
    }
}

pub struct RequestGate {
    config: GateConfig,
    cache: RequestCache,
    limiter: RateLimiter,
}

impl RequestGate {
    pub fn new(config: GateConfig, cache_dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            config,
            cache: RequestCache::new(cache_dir.as_ref())?,
            limiter: RateLimiter::new(),
        })
    }

    /// Execute a request: cache check, then paced attempts with backoff.
    ///
    /// Returns the parsed JSON payload, [`GateError::NotFound`] on a 404, or
    /// [`GateError::Exhausted`] once retries run out.
    pub fn execute(&self, req: &GateRequest) -> Result<Value, GateError> {
        if req.method == Method::Get {
            if let Some(cached) = self.cache.get(&req.url, &req.params) {
                log::debug!("cache hit: {}", req.url);
                return Ok(cached);
            }
        }

        let mut attempts = 0u32;
        loop {
            if let Some(pace) = &req.pace {
                self.limiter.pace(&pace.source, pace.min_interval);
            }

            let err = match self.attempt(req) {
                Ok(value) => {
                    if req.method == Method::Get {
                        self.cache.put(&req.url, &req.params, &value);
                    }
                    return Ok(value);
                }
                Err(AttemptError::Status { code: 404, .. }) => {
                    log::debug!("{}: 404 not found", req.url);
                    return Err(GateError::NotFound);
                }
                Err(e) => e,
            };

            // `attempts` is the 0-based index of the attempt that just failed.
            if attempts >= self.config.max_retries {
                log::error!(
                    "{}: giving up after {} attempts: {err}",
                    req.url,
                    attempts + 1
                );
                return Err(GateError::Exhausted {
                    attempts: attempts + 1,
                    last: err.to_string(),
                });
            }
            let delay_secs = match err {
                AttemptError::RateLimited => {
                    self.config.backoff_factor * f64::from(attempts + 2) * 2.0
                }
                _ => self.config.backoff_factor * f64::from(attempts + 1),
            };
            log::warn!("{}: {err}; retrying in {delay_secs:.1}s", req.url);
            std::thread::sleep(Duration::from_secs_f64(delay_secs));
            attempts += 1;
        }
    }

    fn attempt(&self, req: &GateRequest) -> Result<Value, AttemptError> {
        let result: Result<(u16, String), reqwest::Error> =
            SHARED_RUNTIME.handle().block_on(async {
                let mut builder = match req.method {
                    Method::Get => http_client().get(&req.url),
                    Method::Post => http_client().post(&req.url),
                };
                builder = builder.timeout(REQUEST_TIMEOUT).query(&req.params);
                for (key, value) in &req.headers {
                    builder = builder.header(key, value);
                }
                if let Some(body) = &req.body {
                    builder = builder
                        .header("content-type", "application/json")
                        .body(body.to_string());
                }
                let resp = builder.send().await?;
                let status = resp.status().as_u16();
                let text = resp.text().await?;
                Ok((status, text))
            });

        match result {
            Ok((200, text)) => serde_json::from_str(&text)
                .map_err(|e| AttemptError::Malformed(e.to_string())),
            Ok((429, _)) => Err(AttemptError::RateLimited),
            Ok((code, body)) => Err(AttemptError::Status {
                code,
                body: truncate(&body, 200),
            }),
            Err(e) => Err(AttemptError::Transport(e.to_string())),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
