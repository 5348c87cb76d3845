//! Executes core `HttpRequest`s over the network with ureq.
//!
//! HTTP status codes are never errors here: ureq is configured with
//! `http_status_as_error(false)` so 4xx/5xx responses come back as data for
//! the interpreter. Only I/O and timeout failures are retried.

use std::fmt;
use std::time::Duration;

use shhh_core::{HttpMethod, HttpRequest, HttpResponse};
use tracing::{debug, warn};

pub const DEFAULT_RETRIES: u32 = 2;
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Something that can run one request to completion.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// The request never produced a response, even after retrying.
#[derive(Debug)]
pub struct TransportFailure {
    pub url: String,
    pub attempts: u32,
    pub source: ureq::Error,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request to {} failed: {}", self.url, self.source)?;
        if self.attempts > 1 {
            write!(f, " (after {} attempts)", self.attempts)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransportFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            initial_delay: INITIAL_RETRY_DELAY,
        }
    }

    /// Delay before retry number `retry` (1-based); doubles each time.
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. Returns the last error and the attempt count.
pub fn retry_with_policy<T, E, F, R>(
    policy: RetryPolicy,
    is_retryable: R,
    mut f: F,
) -> Result<T, (E, u32)>
where
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
    E: fmt::Display,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if attempts <= policy.retries && is_retryable(&err) => {
                let delay = policy.delay_before(attempts);
                warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %err, "retrying request");
                std::thread::sleep(delay);
            }
            Err(err) => return Err((err, attempts)),
        }
    }
}

fn is_retryable(err: &ureq::Error) -> bool {
    matches!(err, ureq::Error::Io(_) | ureq::Error::Timeout(_))
}

/// URL safe to print: the read query carries the passphrase.
pub fn display_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

pub struct UreqTransport {
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl UreqTransport {
    pub fn new(retry: RetryPolicy) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, retry }
    }

    fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, ureq::Error> {
        let mut response = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                with_headers(self.agent.get(&request.url), &request.headers).call()?
            }
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&request.url), &request.headers).send(body.as_bytes())?
            }
            (HttpMethod::Post, None) => {
                with_headers(self.agent.post(&request.url), &request.headers).send_empty()?
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let url = display_url(&request.url);
        debug!(method = request.method.as_str(), %url, "sending request");
        let response = retry_with_policy(self.retry, is_retryable, || self.send_once(request))
            .map_err(|(source, attempts)| TransportFailure {
                url: url.to_string(),
                attempts,
                source,
            })?;
        debug!(%url, status = response.status, "received response");
        Ok(response)
    }
}
