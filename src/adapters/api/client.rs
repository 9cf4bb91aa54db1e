//! Resilient export API client
//!
//! A single authenticated call primitive with retry, rate-limit handling,
//! and circuit-breaker gating, plus the four operations built on it:
//! discovery, scheduling, status polling, and result download.

use crate::config::{ApiConfig, FilterConfig};
use crate::core::breaker::{CircuitBreaker, FailureKind};
use crate::domain::ids::{ExportJobId, WorkItemId};
use crate::domain::{ApiError, Job, WorkItem};
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use super::backoff::{PollSchedule, RetrySchedule};
use super::models::{ExportParams, JobStatusResponse, StatusKind, WorkItemRecord};

/// Client for the remote export API
///
/// Every operation first asks the circuit breaker for permission; a
/// denial surfaces as [`ApiError::CircuitOpen`] without any network
/// attempt. Transport and 5xx failures are retried with capped
/// exponential backoff, and every failed attempt is reported to the
/// breaker. Rate-limit responses take a separate path: the client honours
/// the server-suggested wait (capped by configuration) and retries
/// without touching the breaker or consuming a retry attempt.
pub struct ExportApiClient {
    http: Client,
    base_url: Url,
    config: ApiConfig,
    breaker: Arc<CircuitBreaker>,
}

impl ExportApiClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(config: ApiConfig, breaker: Arc<CircuitBreaker>) -> crate::domain::Result<Self> {
        // A trailing slash makes Url::join treat the last segment as a
        // directory rather than replacing it.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            crate::domain::HaulerError::Configuration(format!(
                "Invalid API base URL {}: {e}",
                config.base_url
            ))
        })?;

        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                crate::domain::HaulerError::Configuration(format!(
                    "Failed to build HTTP client: {e}"
                ))
            })?;

        Ok(Self {
            http,
            base_url,
            config,
            breaker,
        })
    }

    /// The circuit breaker guarding this client
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Discover the work items the credential can export.
    ///
    /// Inaccessible items are dropped, then the configured include/exclude
    /// filters apply (matching by id or display name).
    pub async fn discover_work_items(&self) -> Result<Vec<WorkItem>, ApiError> {
        let url = self.endpoint("work-items")?;

        let records: Vec<WorkItemRecord> = self
            .execute("discover_work_items", || async {
                let resp = self.send(self.http.get(url.clone())).await?;
                let resp = self.check_response("discover_work_items", resp).await?;
                resp.json::<Vec<WorkItemRecord>>()
                    .await
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            })
            .await?;

        let total = records.len();
        let mut items = Vec::new();
        for record in records {
            if !record.accessible {
                tracing::debug!(id = %record.id, "Skipping inaccessible work item");
                continue;
            }
            match WorkItemId::new(record.id) {
                Ok(id) => items.push(WorkItem::new(id, record.name)),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping work item with invalid id");
                }
            }
        }

        let items = apply_filters(items, &self.config.filter);

        tracing::info!(
            discovered = total,
            kept = items.len(),
            "Discovered work items"
        );

        Ok(items)
    }

    /// Schedule an export job for a work item.
    ///
    /// The job handle is read from the `Location` header of the response.
    pub async fn schedule_export(
        &self,
        work_item_id: &WorkItemId,
        params: &ExportParams,
    ) -> Result<Job, ApiError> {
        let url = self.endpoint(&format!("work-items/{}/exports", work_item_id))?;

        let location = self
            .execute("schedule_export", || async {
                let request = self.http.post(url.clone()).query(&params.query_pairs());
                let resp = self.send(request).await?;
                let resp = self.check_response("schedule_export", resp).await?;
                resp.headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ApiError::InvalidResponse(
                            "Schedule response carries no Location header".to_string(),
                        )
                    })
            })
            .await?;

        let job_id = job_id_from_location(&location)?;

        tracing::info!(
            work_item_id = %work_item_id,
            job_id = %job_id,
            "Scheduled export job"
        );

        Ok(Job::scheduled(work_item_id.clone(), job_id))
    }

    /// Fetch the current status of an export job
    pub async fn poll_status(&self, job_id: &ExportJobId) -> Result<JobStatusResponse, ApiError> {
        let url = self.endpoint(&format!("exports/{}", job_id))?;

        self.execute("poll_status", || async {
            let resp = self.send(self.http.get(url.clone())).await?;
            let resp = self.check_response("poll_status", resp).await?;
            resp.json::<JobStatusResponse>()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        })
        .await
    }

    /// Poll a job to a terminal state with adaptive cadence.
    ///
    /// Advances `job` through its observed states. Completion fills the
    /// result location; remote failure surfaces as [`ApiError::JobFailed`]
    /// after marking the job failed. Crossing `deadline` surfaces as
    /// [`ApiError::DeadlineExceeded`] so the caller can checkpoint before
    /// the host kills the process.
    pub async fn wait_for_completion(
        &self,
        job: &mut Job,
        deadline: Option<Instant>,
    ) -> Result<(), ApiError> {
        let schedule = PollSchedule::new(&self.config.polling);
        let max_attempts = self.config.polling.max_attempts;

        for attempt in 0..max_attempts {
            let delay = schedule.delay_for(attempt);

            // Never sleep past the deadline: wake exactly at it and bail
            // so the orchestrator still has time to checkpoint.
            let wake = Instant::now() + delay;
            match deadline {
                Some(d) if d <= wake => {
                    tokio::time::sleep_until(d).await;
                    return Err(ApiError::DeadlineExceeded);
                }
                _ => tokio::time::sleep_until(wake).await,
            }

            let report = self.poll_status(&job.job_id).await?;

            match report.kind() {
                StatusKind::Completed => {
                    let location = report.result_location.ok_or_else(|| {
                        ApiError::InvalidResponse(
                            "Completed job carries no result location".to_string(),
                        )
                    })?;
                    job.complete(location).map_err(ApiError::InvalidResponse)?;
                    tracing::info!(job_id = %job.job_id, polls = attempt + 1, "Export job completed");
                    return Ok(());
                }
                StatusKind::Failed => {
                    let reason = report
                        .error
                        .unwrap_or_else(|| "no error message supplied".to_string());
                    job.fail(reason.clone()).map_err(ApiError::InvalidResponse)?;
                    return Err(ApiError::JobFailed {
                        job_id: job.job_id.to_string(),
                        reason,
                    });
                }
                StatusKind::StillRunning => {
                    tracing::debug!(
                        job_id = %job.job_id,
                        status = %report.status,
                        attempt = attempt + 1,
                        "Export job still running"
                    );
                    let _ = job.advance_to(crate::domain::JobStatus::Running);
                }
            }
        }

        Err(ApiError::PollExhausted {
            job_id: job.job_id.to_string(),
            attempts: max_attempts,
        })
    }

    /// Download a completed job's result payload.
    ///
    /// Relative locations are resolved against the API base URL.
    pub async fn download_result(&self, location: &str) -> Result<String, ApiError> {
        let url = self.resolve_location(location)?;

        self.execute("download_result", || async {
            let resp = self.send(self.http.get(url.clone())).await?;
            let resp = self.check_response("download_result", resp).await?;
            resp.text()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        })
        .await
    }

    /// Resilient call primitive.
    ///
    /// Retries transport/5xx failures with capped exponential backoff and
    /// jitter, reporting each failed attempt to the breaker. Rate-limit
    /// errors sleep the suggested wait (capped) and go around again
    /// without consuming a retry attempt.
    async fn execute<T, F, Fut>(&self, op: &str, operation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let schedule = RetrySchedule::new(&self.config.retry);
        let max_retries = self.config.retry.max_retries;
        let mut attempt: u32 = 0;
        let mut rate_limit_waits: u32 = 0;

        loop {
            if !self.breaker.can_execute() {
                tracing::warn!(op, "Circuit breaker open, refusing call");
                return Err(ApiError::CircuitOpen);
            }

            match operation().await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(ApiError::RateLimited { wait }) => {
                    // Flow control, not a fault: this never counts toward
                    // the breaker threshold (it only releases a half-open
                    // trial slot) and never consumes a retry attempt.
                    self.breaker.record_failure(FailureKind::RateLimited);

                    let cap = self.config.rate_limit.max_wait();
                    if wait > cap {
                        tracing::warn!(
                            op,
                            wait_secs = wait.as_secs(),
                            cap_secs = cap.as_secs(),
                            "Suggested rate-limit wait exceeds ceiling, failing fast"
                        );
                        return Err(ApiError::RateLimitWaitTooLong { wait, cap });
                    }

                    rate_limit_waits += 1;
                    if rate_limit_waits > self.config.rate_limit.max_consecutive_waits {
                        tracing::warn!(
                            op,
                            waits = rate_limit_waits - 1,
                            "Remote is persistently throttling this call, giving up"
                        );
                        return Err(ApiError::RateLimited { wait });
                    }

                    tracing::info!(
                        op,
                        wait_secs = wait.as_secs(),
                        "Rate limited, honouring suggested wait"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) if e.is_retryable() => {
                    self.breaker.record_failure(FailureKind::Fault);
                    rate_limit_waits = 0;
                    attempt += 1;
                    if attempt >= max_retries {
                        tracing::error!(
                            op,
                            attempts = attempt,
                            error = %e,
                            "Retries exhausted"
                        );
                        return Err(e);
                    }

                    let delay = {
                        let base = schedule.delay_for(attempt - 1);
                        let jitter_ms = rand::thread_rng()
                            .gen_range(0..=(base.as_millis() as u64 / 10).max(1));
                        (base + Duration::from_millis(jitter_ms)).min(schedule.max_delay())
                    };

                    tracing::warn!(
                        op,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    // 4xx and unparseable responses mean the remote is
                    // answering; settle any half-open trial as a success
                    // so the breaker reflects service health, not ours.
                    self.breaker.record_success();
                    return Err(e);
                }
            }
        }
    }

    /// Send a request with authentication, mapping transport errors
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let request = match self.auth_header_value() {
            Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
            None => request,
        };

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(e.to_string())
            } else {
                ApiError::Transport(e.to_string())
            }
        })
    }

    /// Map a non-success response into the error taxonomy
    async fn check_response(&self, op: &str, resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| self.config.rate_limit.default_wait());
            return Err(ApiError::RateLimited { wait });
        }

        let message = resp.text().await.unwrap_or_default();
        tracing::debug!(op, status = status.as_u16(), body = %message, "Non-success response");

        if status.is_server_error() {
            Err(ApiError::ServerError {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(ApiError::ClientError {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Build authorization header value: bearer token when configured,
    /// basic credentials otherwise
    fn auth_header_value(&self) -> Option<String> {
        if let Some(ref token) = self.config.auth_token {
            Some(format!("Bearer {}", token.expose_secret()))
        } else if let (Some(ref username), Some(ref password)) =
            (&self.config.username, &self.config.password)
        {
            let credentials = format!("{username}:{}", password.expose_secret());
            let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
            Some(format!("Basic {encoded}"))
        } else {
            None
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidResponse(format!("Bad endpoint path {path}: {e}")))
    }

    fn resolve_location(&self, location: &str) -> Result<Url, ApiError> {
        match Url::parse(location) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url.join(location.trim_start_matches('/')).map_err(|e| {
                    ApiError::InvalidResponse(format!("Bad result location {location}: {e}"))
                })
            }
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "Bad result location {location}: {e}"
            ))),
        }
    }
}

/// Apply include/exclude filters to discovered items
fn apply_filters(items: Vec<WorkItem>, filter: &FilterConfig) -> Vec<WorkItem> {
    items
        .into_iter()
        .filter(|item| {
            if !filter.include.is_empty()
                && !filter.include.iter().any(|f| item.matches_filter(f))
            {
                return false;
            }
            !filter.exclude.iter().any(|f| item.matches_filter(f))
        })
        .collect()
}

/// Extract the job id from a Location header URI (its last path segment)
fn job_id_from_location(location: &str) -> Result<ExportJobId, ApiError> {
    let trimmed = location.trim_end_matches('/');
    let segment = trimmed
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!("Location header has no job id: {location}"))
        })?;

    // Strip any query string the remote tacks on
    let segment = segment.split('?').next().unwrap_or(segment);

    ExportJobId::from_str(segment)
        .map_err(|e| ApiError::InvalidResponse(format!("Invalid job id in Location header: {e}")))
}
