use reqwest::{Client, Method, Request, Response, StatusCode};
use std::time::Duration;

/// Delay schedule between attempts. `attempt` is 1-based: the delay
/// before the second attempt is `delay(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Transport-level retry applied beneath the orchestrator.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub retry_statuses: Vec<StatusCode>,
    pub retry_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(120),
            },
            retry_statuses: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            retry_methods: vec![Method::POST, Method::PUT],
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.retry_methods.contains(method)
    }

    pub fn is_transient(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Sends `request`, re-sending it on transient statuses and
    /// connect/timeout errors while attempts remain. The final response or
    /// error is returned unchanged.
    pub async fn execute(&self, client: &Client, request: Request) -> reqwest::Result<Response> {
        let retryable = self.allows_method(request.method());
        let mut attempt = 1;

        loop {
            let retry_copy = if retryable && attempt < self.max_attempts {
                request.try_clone()
            } else {
                None
            };

            let Some(current) = retry_copy else {
                return client.execute(request).await;
            };

            let method = current.method().clone();
            let url = current.url().clone();

            match client.execute(current).await {
                Ok(response) if self.is_transient(response.status()) => {
                    log::warn!(
                        "🔁 {} {} returned {} (attempt {}/{}), retrying",
                        method,
                        url.path(),
                        response.status(),
                        attempt,
                        self.max_attempts
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    log::warn!(
                        "🔁 {} {} failed: {} (attempt {}/{}), retrying",
                        method,
                        url.path(),
                        e,
                        attempt,
                        self.max_attempts
                    );
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }
}
