use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{CreateJobResponse, ErrorBody};
use crate::config::{ApiConfig, RequestConfig};
use crate::error::{JobError, JobResult};

/// Request/response operations of the backend job API.
///
/// Streaming lives in [`super::EventSource`]; this trait covers the
/// one-shot calls a session makes around a stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a job at `endpoint` and return its id.
    async fn submit(&self, endpoint: &str, payload: &serde_json::Value) -> JobResult<String>;

    /// Fetch the stored result of a completed job.
    async fn fetch_result(&self, job_id: &str) -> JobResult<serde_json::Value>;

    /// Ask the backend to cancel a job. Never fails.
    async fn cancel(&self, job_id: &str);
}

/// HTTP client for the analysis job API
#[derive(Clone)]
pub struct JobClient {
    client: Client,
    base_url: Url,
}

impl JobClient {
    /// Create a new job client
    pub fn new(config: &ApiConfig, request_config: &RequestConfig) -> JobResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(request_config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Underlying HTTP client, shared with the event source.
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    pub(crate) fn url_for<'a, I>(&self, segments: I) -> JobResult<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        join_segments(&self.base_url, segments)
    }

    /// URL of a mode or scrape endpoint such as `/bias`.
    fn endpoint_url(&self, endpoint: &str) -> JobResult<Url> {
        self.url_for(endpoint.split('/').filter(|s| !s.is_empty()))
    }

    /// Map a non-2xx response to [`JobError::HttpStatus`], preferring the
    /// message the backend put in the body.
    async fn status_error(response: Response) -> JobError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("Request failed: {}", status));

        JobError::HttpStatus { status, message }
    }
}

#[async_trait]
impl JobApi for JobClient {
    async fn submit(&self, endpoint: &str, payload: &serde_json::Value) -> JobResult<String> {
        let url = self.endpoint_url(endpoint)?;
        let start = Instant::now();

        debug!(endpoint = %endpoint, "Submitting job");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %endpoint, error = %e, "Job submission unreachable");
                JobError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::status_error(response).await;
            warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                error = %err,
                "Job submission rejected"
            );
            return Err(err);
        }

        let created: CreateJobResponse =
            response
                .json()
                .await
                .map_err(|e| JobError::InvalidResponse {
                    message: format!("Failed to parse job creation response: {}", e),
                })?;

        if created.job_id.is_empty() {
            return Err(JobError::InvalidResponse {
                message: "Job creation response carried an empty job_id".to_string(),
            });
        }

        info!(
            endpoint = %endpoint,
            job_id = %created.job_id,
            latency_ms = start.elapsed().as_millis(),
            "Job submitted"
        );

        Ok(created.job_id)
    }

    async fn fetch_result(&self, job_id: &str) -> JobResult<serde_json::Value> {
        let url = self.url_for(["job", job_id])?;

        debug!(job_id = %job_id, "Fetching job result");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(JobError::HttpStatus {
                status: status.as_u16(),
                message: format!("Failed to fetch result: {}", status.as_u16()),
            });
        }

        let mut body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| JobError::InvalidResponse {
                    message: format!("Failed to parse job result: {}", e),
                })?;

        let result = if body.get("result").is_some() {
            body["result"].take()
        } else {
            body
        };

        info!(job_id = %job_id, "Job result fetched");
        Ok(result)
    }

    async fn cancel(&self, job_id: &str) {
        let url = match self.url_for(["job", job_id, "cancel"]) {
            Ok(url) => url,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Cannot build cancel URL");
                return;
            }
        };

        match self.client.post(url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(job_id = %job_id, "Job cancellation requested");
            }
            Ok(response) => {
                warn!(
                    job_id = %job_id,
                    status = response.status().as_u16(),
                    "Job cancellation rejected"
                );
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Job cancellation failed");
            }
        }
    }
}

/// Parse and validate a base URL that job paths can be appended to.
pub(crate) fn parse_base_url(raw: &str) -> JobResult<Url> {
    let url = Url::parse(raw).map_err(|_| JobError::InvalidBaseUrl {
        url: raw.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(JobError::InvalidBaseUrl {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

pub(crate) fn join_segments<'a, I>(base: &Url, segments: I) -> JobResult<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| JobError::InvalidBaseUrl {
            url: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> JobClient {
        let config = ApiConfig {
            base_url: base_url.to_string(),
        };
        JobClient::new(&config, &RequestConfig::default()).expect("client")
    }

    #[test]
    fn test_client_creation() {
        let config = ApiConfig {
            base_url: "https://api.example.com".to_string(),
        };
        assert!(JobClient::new(&config, &RequestConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        let config = ApiConfig {
            base_url: "mailto:ops@example.com".to_string(),
        };
        assert!(matches!(
            JobClient::new(&config, &RequestConfig::default()),
            Err(JobError::InvalidBaseUrl { .. })
        ));

        let config = ApiConfig {
            base_url: "not a url".to_string(),
        };
        assert!(JobClient::new(&config, &RequestConfig::default()).is_err());
    }

    #[test]
    fn test_endpoint_url_keeps_base_prefix() {
        let c = client("https://api.example.com/v2/");
        assert_eq!(
            c.endpoint_url("/bias").unwrap().as_str(),
            "https://api.example.com/v2/bias"
        );
        let c = client("https://api.example.com/v2");
        assert_eq!(
            c.endpoint_url("/comprehensive-analysis").unwrap().as_str(),
            "https://api.example.com/v2/comprehensive-analysis"
        );
    }

    #[test]
    fn test_job_id_is_one_encoded_segment() {
        let c = client("https://api.example.com");
        assert_eq!(
            c.url_for(["job", "a/b c", "cancel"]).unwrap().as_str(),
            "https://api.example.com/job/a%2Fb%20c/cancel"
        );
    }
}
