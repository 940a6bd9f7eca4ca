//! Retry/transport engine — dispatches a request, classifies the outcome,
//! and retries rate limits and transient failures within an attempt budget.
//!
//! | Outcome            | Action                                         |
//! |--------------------|------------------------------------------------|
//! | 2xx                | return the body                                |
//! | 429                | sleep `retry-after` (default 1 s), retry        |
//! | other 4xx          | fail immediately with status and body          |
//! | 5xx / network      | sleep `retry_delay`, retry                     |
//!
//! Every attempt, rate-limited ones included, counts toward the budget.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use aihelper_core::utils::truncate_string;
use aihelper_core::{AiError, Provider, ProviderConfiguration, Result};

use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Delay used when a 429 carries no usable `retry-after` header.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(1_000);

// ─────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, never less than one.
    pub max_attempts: u32,
    /// Sleep between attempts after a transient failure.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_retry_count.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &ProviderConfiguration) -> Self {
        Self::new(config.max_retry_count, config.retry_delay())
    }
}

// ─────────────────────────────────────────────
// Outcome classification
// ─────────────────────────────────────────────

/// Why an attempt is worth repeating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited { retry_after: Duration },
    Transient(String),
}

impl RetryReason {
    /// How long to wait before the next attempt.
    pub fn delay(&self, policy: &RetryPolicy) -> Duration {
        match self {
            RetryReason::RateLimited { retry_after } => *retry_after,
            RetryReason::Transient(_) => policy.retry_delay,
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::RateLimited { retry_after } => {
                write!(f, "rate limited (retry after {}ms)", retry_after.as_millis())
            }
            RetryReason::Transient(reason) => f.write_str(reason),
        }
    }
}

/// Result of one attempt.
#[derive(Debug)]
pub enum RetryOutcome {
    Success(String),
    RetriableFailure(RetryReason),
    TerminalFailure(AiError),
}

/// Parse a `retry-after` value given in seconds; fall back to one second.
pub fn parse_retry_after(value: Option<&str>) -> Duration {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| Duration::from_millis((secs * 1000.0) as u64))
        .unwrap_or(DEFAULT_RATE_LIMIT_DELAY)
}

/// Decide what one transport result means for the retry loop.
pub fn classify(provider: Provider, result: std::result::Result<HttpResponse, String>) -> RetryOutcome {
    let response = match result {
        Ok(response) => response,
        Err(network) => return RetryOutcome::RetriableFailure(RetryReason::Transient(network)),
    };

    match response.status {
        200..=299 => RetryOutcome::Success(response.body),
        429 => RetryOutcome::RetriableFailure(RetryReason::RateLimited {
            retry_after: parse_retry_after(response.retry_after.as_deref()),
        }),
        400..=499 => RetryOutcome::TerminalFailure(AiError::TerminalHttp {
            provider,
            status: response.status,
            body: response.body,
        }),
        status => RetryOutcome::RetriableFailure(RetryReason::Transient(format!(
            "HTTP {status}: {}",
            truncate_string(&response.body, 200)
        ))),
    }
}

// ─────────────────────────────────────────────
// Retry loop
// ─────────────────────────────────────────────

/// Run `send` until it succeeds, fails terminally, or the budget runs out.
///
/// `send` receives the 1-based attempt number. `sleep` is injected so tests
/// can observe delays without waiting.
pub async fn execute_with_retry<Op, OpFuture, Sleep, SleepFuture>(
    provider: Provider,
    policy: &RetryPolicy,
    mut send: Op,
    mut sleep: Sleep,
) -> Result<String>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = std::result::Result<HttpResponse, String>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!(%provider, attempt, max_attempts, "dispatching request");

        match classify(provider, send(attempt).await) {
            RetryOutcome::Success(body) => return Ok(body),
            RetryOutcome::TerminalFailure(err) => {
                error!(%provider, attempt, error = %err, "request failed");
                return Err(err);
            }
            RetryOutcome::RetriableFailure(reason) => {
                if attempt >= max_attempts {
                    error!(%provider, attempts = attempt, %reason, "retries exhausted");
                    return Err(AiError::RetriesExhausted {
                        attempts: attempt,
                        last_error: reason.to_string(),
                    });
                }
                let delay = reason.delay(policy);
                warn!(
                    %provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "retrying request"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Retry loop bound to a shared transport and a provider's policy.
#[derive(Clone)]
pub struct RetryEngine {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    provider: Provider,
}

impl RetryEngine {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy, provider: Provider) -> Self {
        Self {
            transport,
            policy,
            provider,
        }
    }

    /// Send the request produced by `build`, which runs once per attempt.
    pub async fn execute(&self, build: impl Fn() -> HttpRequest + Send) -> Result<String> {
        let transport = &self.transport;
        execute_with_retry(
            self.provider,
            &self.policy,
            move |_| transport.post(build()),
            tokio::time::sleep,
        )
        .await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::ScriptedTransport;
    use std::sync::Mutex;

    fn ok(body: &str) -> std::result::Result<HttpResponse, String> {
        Ok(HttpResponse::new(200, body))
    }

    fn status(code: u16) -> std::result::Result<HttpResponse, String> {
        Ok(HttpResponse::new(code, format!("status {code}")))
    }

    /// Run the loop over a fixed script, recording every sleep.
    async fn run_script(
        policy: RetryPolicy,
        script: Vec<std::result::Result<HttpResponse, String>>,
    ) -> (Result<String>, u32, Vec<Duration>) {
        let script = Mutex::new(script.into_iter());
        let calls = Mutex::new(0u32);
        let sleeps = Mutex::new(Vec::new());

        let result = execute_with_retry(
            Provider::OpenAi,
            &policy,
            |_| {
                *calls.lock().unwrap() += 1;
                let next = script.lock().unwrap().next().unwrap_or_else(|| status(500));
                async move { next }
            },
            |delay| {
                sleeps.lock().unwrap().push(delay);
                async {}
            },
        )
        .await;

        let calls = *calls.lock().unwrap();
        (result, calls, sleeps.into_inner().unwrap())
    }

    #[test]
    fn test_policy_always_allows_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::new(3, Duration::ZERO).max_attempts, 3);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("2")), Duration::from_secs(2));
        assert_eq!(parse_retry_after(Some(" 0.5 ")), Duration::from_millis(500));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), DEFAULT_RATE_LIMIT_DELAY);
        assert_eq!(parse_retry_after(Some("-3")), DEFAULT_RATE_LIMIT_DELAY);
        assert_eq!(parse_retry_after(None), DEFAULT_RATE_LIMIT_DELAY);
    }

    #[test]
    fn test_classify() {
        assert!(matches!(classify(Provider::OpenAi, ok("x")), RetryOutcome::Success(b) if b == "x"));
        assert!(matches!(
            classify(Provider::OpenAi, status(429)),
            RetryOutcome::RetriableFailure(RetryReason::RateLimited { .. })
        ));
        assert!(matches!(
            classify(Provider::Anthropic, status(401)),
            RetryOutcome::TerminalFailure(AiError::TerminalHttp { status: 401, .. })
        ));
        assert!(matches!(
            classify(Provider::OpenAi, status(503)),
            RetryOutcome::RetriableFailure(RetryReason::Transient(_))
        ));
        assert!(matches!(
            classify(Provider::OpenAi, Err("connection reset".into())),
            RetryOutcome::RetriableFailure(RetryReason::Transient(r)) if r == "connection reset"
        ));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let (result, calls, sleeps) =
            run_script(policy, vec![status(503), status(503), ok("done")]).await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
        assert_eq!(sleeps, vec![Duration::from_millis(10); 2]);
    }

    #[tokio::test]
    async fn test_rate_limit_uses_retry_after() {
        let limited = Ok(HttpResponse {
            status: 429,
            retry_after: Some("3".into()),
            body: String::new(),
        });
        let (result, calls, sleeps) =
            run_script(RetryPolicy::new(3, Duration::from_millis(10)), vec![limited, ok("ok")]).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls, 2);
        assert_eq!(sleeps, vec![Duration::from_secs(3)]);
    }

    #[tokio::test]
    async fn test_rate_limit_without_header_defaults_to_one_second() {
        let (result, _, sleeps) =
            run_script(RetryPolicy::new(2, Duration::from_millis(10)), vec![status(429), ok("ok")]).await;
        assert!(result.is_ok());
        assert_eq!(sleeps, vec![DEFAULT_RATE_LIMIT_DELAY]);
    }

    #[tokio::test]
    async fn test_not_found_is_terminal() {
        let (result, calls, sleeps) =
            run_script(RetryPolicy::new(5, Duration::from_millis(10)), vec![status(404), ok("never")]).await;

        match result.unwrap_err() {
            AiError::TerminalHttp { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "status 404");
            }
            other => panic!("expected TerminalHttp, got {other:?}"),
        }
        assert_eq!(calls, 1);
        assert!(sleeps.is_empty());
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let (result, calls, sleeps) = run_script(
            RetryPolicy::new(3, Duration::from_millis(10)),
            vec![status(500), Err("timed out".into()), status(429)],
        )
        .await;

        match result.unwrap_err() {
            AiError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("rate limited"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(calls, 3);
        assert_eq!(sleeps.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_retry_count_makes_single_attempt() {
        let (result, calls, sleeps) =
            run_script(RetryPolicy::new(0, Duration::from_millis(10)), vec![status(502)]).await;
        assert!(matches!(result, Err(AiError::RetriesExhausted { attempts: 1, .. })));
        assert_eq!(calls, 1);
        assert!(sleeps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_builds_request_per_attempt() {
        let transport = Arc::new(ScriptedTransport::responses([(503, "busy"), (200, "fine")]));
        let engine = RetryEngine::new(
            transport.clone(),
            RetryPolicy::new(3, Duration::from_millis(250)),
            Provider::OpenAi,
        );

        let built = Mutex::new(0u32);
        let started = tokio::time::Instant::now();
        let body = engine
            .execute(|| {
                let mut n = built.lock().unwrap();
                *n += 1;
                HttpRequest {
                    url: "http://localhost/v1/chat/completions".into(),
                    headers: vec![("x-attempt".into(), n.to_string())],
                    body: "{}".into(),
                }
            })
            .await
            .unwrap();

        assert_eq!(body, "fine");
        assert_eq!(started.elapsed(), Duration::from_millis(250));
        let attempts: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.headers[0].1.clone())
            .collect();
        assert_eq!(attempts, vec!["1", "2"]);
    }
}
