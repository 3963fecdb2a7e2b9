//! Job event stream subscription with reconnect backoff.
//!
//! A [`JobStream`] opens one channel per subscription through an
//! [`EventSource`], parses each payload into a [`JobEvent`] and forwards it to
//! a [`StreamHandler`]:
//!
//! - heartbeats are dropped
//! - messages go to [`StreamHandler::on_message`]
//! - a terminal status closes the channel and fires exactly one of
//!   [`StreamHandler::on_complete`] / [`StreamHandler::on_error`]
//! - malformed payloads are dropped and the channel stays open
//!
//! Transport failures (connect error, read error, the server closing the
//! stream early, or a heartbeat timeout when configured) close the channel and
//! reopen it after `base * 2^attempt`. Once `max_reconnect_attempts` reopen
//! attempts have been spent, the handler receives
//! [`JobError::ReconnectExhausted`]. The attempt counter lives for the whole
//! subscription; only a new [`JobStream::subscribe`] starts from zero.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, Url};
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{join_segments, parse_base_url};
use super::sse::decode_event_stream;
use super::types::{JobEvent, GENERIC_FAILURE_MESSAGE};
use crate::config::{ApiConfig, StreamConfig};
use crate::error::{JobError, JobResult};

/// Payloads of one open channel, in arrival order.
pub type EventFrames = Pin<Box<dyn Stream<Item = JobResult<String>> + Send>>;

/// Opens server-push channels scoped to a job.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a channel for `job_id`. Errors are treated as transport failures.
    async fn connect(&self, job_id: &str) -> JobResult<EventFrames>;
}

/// [`EventSource`] over `GET /job/{id}/stream` (`text/event-stream`).
#[derive(Clone)]
pub struct HttpEventSource {
    client: Client,
    base_url: Url,
}

impl HttpEventSource {
    /// Create an event source reusing an existing HTTP client.
    pub fn new(client: Client, config: &ApiConfig) -> JobResult<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn connect(&self, job_id: &str) -> JobResult<EventFrames> {
        let url = join_segments(&self.base_url, ["job", job_id, "stream"])?;

        let response = self
            .client
            .get(url)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| JobError::StreamTransport {
                message: format!("Failed to open event stream: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobError::StreamTransport {
                message: format!("Event stream rejected with status {}", status.as_u16()),
            });
        }

        debug!(job_id = %job_id, "Event stream connected");
        Ok(Box::pin(decode_event_stream(response.bytes_stream())))
    }
}

/// Receives the outcome of a subscription.
///
/// After `on_complete` or `on_error` no further callback fires.
pub trait StreamHandler: Send + 'static {
    /// A progress message arrived.
    fn on_message(&mut self, text: String);

    /// The job completed; the result must be fetched separately.
    fn on_complete(&mut self);

    /// The job failed, was cancelled, or the connection was lost.
    fn on_error(&mut self, error: JobError);
}

/// Handle to a live subscription.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    job_id: String,
    token: CancellationToken,
}

impl Subscription {
    /// Job this subscription belongs to.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Close the channel and cancel any pending reconnect.
    ///
    /// Idempotent, and harmless after the stream ended on its own.
    pub fn unsubscribe(&self) {
        if !self.token.is_cancelled() {
            debug!(job_id = %self.job_id, "Unsubscribing from job stream");
            self.token.cancel();
        }
    }

    /// Whether the subscription has ended, by unsubscribe or terminal event.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Subscribes to job event streams.
#[derive(Clone)]
pub struct JobStream {
    source: Arc<dyn EventSource>,
    config: StreamConfig,
}

enum ChannelOutcome {
    Terminal,
    Transport(JobError),
}

impl JobStream {
    /// Create a stream client over `source`
    pub fn new(source: Arc<dyn EventSource>, config: StreamConfig) -> Self {
        Self { source, config }
    }

    /// Reconnect configuration in use.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open a subscription for `job_id`. Must be called inside a tokio runtime.
    pub fn subscribe<H: StreamHandler>(&self, job_id: impl Into<String>, handler: H) -> Subscription {
        let job_id = job_id.into();
        let token = CancellationToken::new();

        info!(job_id = %job_id, "Subscribing to job stream");

        tokio::spawn(run_subscription(
            self.source.clone(),
            self.config.clone(),
            job_id.clone(),
            handler,
            token.clone(),
        ));

        Subscription { job_id, token }
    }
}

async fn run_subscription<H: StreamHandler>(
    source: Arc<dyn EventSource>,
    config: StreamConfig,
    job_id: String,
    mut handler: H,
    token: CancellationToken,
) {
    let mut attempts: u32 = 0;

    loop {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            outcome = pump_channel(source.as_ref(), &config, &job_id, &mut handler, &token) => outcome,
        };

        let err = match outcome {
            ChannelOutcome::Terminal => {
                token.cancel();
                return;
            }
            ChannelOutcome::Transport(err) => err,
        };

        if attempts >= config.max_reconnect_attempts {
            warn!(
                job_id = %job_id,
                attempts,
                error = %err,
                "Event stream reconnect attempts exhausted"
            );
            if !token.is_cancelled() {
                token.cancel();
                handler.on_error(JobError::ReconnectExhausted { attempts });
            }
            return;
        }

        attempts += 1;
        let delay = config.reconnect_delay(attempts);
        warn!(
            job_id = %job_id,
            attempt = attempts,
            delay_ms = delay.as_millis(),
            error = %err,
            "Event stream lost, scheduling reconnect"
        );

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Run one channel until it ends. Handler callbacks fire from here.
async fn pump_channel<H: StreamHandler>(
    source: &dyn EventSource,
    config: &StreamConfig,
    job_id: &str,
    handler: &mut H,
    token: &CancellationToken,
) -> ChannelOutcome {
    let mut frames = match source.connect(job_id).await {
        Ok(frames) => frames,
        Err(err) => return ChannelOutcome::Transport(err),
    };

    loop {
        let next = match config.heartbeat_timeout() {
            Some(limit) => match tokio::time::timeout(limit, frames.next()).await {
                Ok(next) => next,
                Err(_) => {
                    return ChannelOutcome::Transport(JobError::StreamTransport {
                        message: format!("No events received within {}ms", limit.as_millis()),
                    })
                }
            },
            None => frames.next().await,
        };

        let data = match next {
            Some(Ok(data)) => data,
            Some(Err(err)) => return ChannelOutcome::Transport(err),
            None => {
                return ChannelOutcome::Transport(JobError::StreamTransport {
                    message: "Event stream closed before a final status".to_string(),
                })
            }
        };

        if token.is_cancelled() {
            return ChannelOutcome::Terminal;
        }

        let Some(event) = JobEvent::parse(&data) else {
            continue;
        };

        match event {
            JobEvent::Heartbeat => {}
            JobEvent::Message(text) => handler.on_message(text),
            JobEvent::Completed => {
                info!(job_id = %job_id, "Job completed");
                token.cancel();
                handler.on_complete();
                return ChannelOutcome::Terminal;
            }
            JobEvent::Failed(message) => {
                let message = message.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                warn!(job_id = %job_id, error = %message, "Job failed");
                token.cancel();
                handler.on_error(JobError::JobFailed { message });
                return ChannelOutcome::Terminal;
            }
            JobEvent::Cancelled => {
                info!(job_id = %job_id, "Job cancelled by server");
                token.cancel();
                handler.on_error(JobError::JobCancelled);
                return ChannelOutcome::Terminal;
            }
        }
    }
}
