use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::modes::{AnalysisMode, SourceContext};

/// What a submitted job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Fetch and extract an article from a URL.
    Scrape,
    /// Run an analysis in the given mode.
    Analysis(AnalysisMode),
}

impl JobKind {
    /// Submission endpoint for this kind of job.
    pub fn endpoint(&self) -> &'static str {
        match self {
            JobKind::Scrape => SCRAPE_ENDPOINT,
            JobKind::Analysis(mode) => mode.endpoint(),
        }
    }
}

/// Endpoint for the URL-scrape job.
pub const SCRAPE_ENDPOINT: &str = "/scrape";

/// Successful job-creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    /// Server-assigned job id.
    pub job_id: String,
}

/// Error body returned with a non-2xx status.
///
/// `error` is either a plain string or an object with its own `message`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message, if the body carries one.
    pub(crate) fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.is_empty()) {
            return Some(message);
        }
        self.error.and_then(failure_message)
    }
}

/// Message used when a job fails without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed";

/// An event pushed over a job's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// Keep-alive; never surfaced.
    Heartbeat,
    /// Progress narration.
    Message(String),
    /// Terminal: the result is ready to fetch.
    Completed,
    /// Terminal: the job failed, optionally with a server message.
    Failed(Option<String>),
    /// Terminal: the job was cancelled server-side.
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    heartbeat: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl JobEvent {
    /// Parse one event payload. Returns `None` for anything that is not a
    /// recognizable event; such payloads are dropped by the stream.
    pub fn parse(data: &str) -> Option<JobEvent> {
        let raw: RawEvent = match serde_json::from_str(data) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "Dropping malformed stream event");
                return None;
            }
        };

        match raw.status.as_deref() {
            Some("completed") => return Some(JobEvent::Completed),
            Some("failed") => {
                return Some(JobEvent::Failed(raw.error.and_then(failure_message)));
            }
            Some("cancelled") => return Some(JobEvent::Cancelled),
            _ => {}
        }

        if let Some(message) = raw.message {
            return Some(JobEvent::Message(message));
        }

        if raw.heartbeat.is_some() || raw.kind.as_deref() == Some("heartbeat") {
            return Some(JobEvent::Heartbeat);
        }

        debug!(status = ?raw.status, "Dropping unrecognized stream event");
        None
    }

    /// Whether this event ends the job's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Completed | JobEvent::Failed(_) | JobEvent::Cancelled
        )
    }
}

/// Failure text from a string or `{ "message": ... }` error field.
fn failure_message(error: serde_json::Value) -> Option<String> {
    let message = match error {
        serde_json::Value::String(s) => s,
        serde_json::Value::Object(map) => map.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    (!message.is_empty()).then_some(message)
}

/// Article produced by the fetch-URL flow.
///
/// Fields are read leniently: numbers and booleans become text, and any other
/// non-string value reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Canonical article URL.
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    /// Headline.
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// Extracted article text.
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    /// Byline.
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    /// Publication date as sent by the backend.
    #[serde(default, alias = "publish_date", deserialize_with = "lenient_text")]
    pub published_date: Option<String>,
    /// Outlet name.
    #[serde(default, deserialize_with = "lenient_text")]
    pub publication_name: Option<String>,
    /// Outlet credibility tier.
    #[serde(default, deserialize_with = "lenient_text")]
    pub credibility_tier: Option<String>,
    /// Outlet bias rating.
    #[serde(default, deserialize_with = "lenient_text")]
    pub bias_rating: Option<String>,
    /// Outlet factual-reporting rating.
    #[serde(default, deserialize_with = "lenient_text")]
    pub factual_reporting: Option<String>,
}

/// Read a string field, stringifying scalars and dropping anything else.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl Article {
    /// Article content, if non-empty.
    pub fn non_empty_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Credibility metadata to forward with an analysis, if any is present.
    pub fn source_context(&self) -> Option<SourceContext> {
        let context = SourceContext {
            publication_name: self.publication_name.clone(),
            credibility_tier: self.credibility_tier.clone(),
            bias_rating: self.bias_rating.clone(),
            factual_reporting: self.factual_reporting.clone(),
        };
        (!context.is_empty()).then_some(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_heartbeat_shapes() {
        assert_eq!(JobEvent::parse(r#"{"heartbeat":true}"#), Some(JobEvent::Heartbeat));
        assert_eq!(JobEvent::parse(r#"{"type":"heartbeat"}"#), Some(JobEvent::Heartbeat));
    }

    #[test]
    fn test_parse_message() {
        assert_eq!(
            JobEvent::parse(r#"{"message":"Starting..."}"#),
            Some(JobEvent::Message("Starting...".to_string()))
        );
    }

    #[test]
    fn test_parse_terminal_statuses() {
        assert_eq!(JobEvent::parse(r#"{"status":"completed"}"#), Some(JobEvent::Completed));
        assert_eq!(
            JobEvent::parse(r#"{"status":"failed","error":"timeout"}"#),
            Some(JobEvent::Failed(Some("timeout".to_string())))
        );
        assert_eq!(
            JobEvent::parse(r#"{"status":"failed"}"#),
            Some(JobEvent::Failed(None))
        );
        assert_eq!(
            JobEvent::parse(r#"{"status":"failed","error":""}"#),
            Some(JobEvent::Failed(None))
        );
        assert_eq!(
            JobEvent::parse(r#"{"status":"failed","error":{"message":"Quota exceeded"}}"#),
            Some(JobEvent::Failed(Some("Quota exceeded".to_string())))
        );
        assert_eq!(JobEvent::parse(r#"{"status":"cancelled"}"#), Some(JobEvent::Cancelled));
    }

    #[test]
    fn test_terminal_status_wins_over_message() {
        assert_eq!(
            JobEvent::parse(r#"{"status":"completed","message":"done"}"#),
            Some(JobEvent::Completed)
        );
    }

    #[test]
    fn test_non_terminal_status_with_message_is_a_message() {
        assert_eq!(
            JobEvent::parse(r#"{"status":"running","message":"Step 2"}"#),
            Some(JobEvent::Message("Step 2".to_string()))
        );
        assert_eq!(JobEvent::parse(r#"{"status":"running"}"#), None);
    }

    #[test]
    fn test_malformed_payloads_are_dropped() {
        assert_eq!(JobEvent::parse("not json"), None);
        assert_eq!(JobEvent::parse("[1,2]"), None);
        assert_eq!(JobEvent::parse("{}"), None);
        assert_eq!(JobEvent::parse(r#"{"message":42}"#), None);
    }

    #[test]
    fn test_is_terminal() {
        assert!(JobEvent::Completed.is_terminal());
        assert!(JobEvent::Cancelled.is_terminal());
        assert!(JobEvent::Failed(None).is_terminal());
        assert!(!JobEvent::Heartbeat.is_terminal());
        assert!(!JobEvent::Message("x".to_string()).is_terminal());
    }

    #[test]
    fn test_error_body_message_sources() {
        let body: ErrorBody = serde_json::from_value(json!({"message": "Bad content"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Bad content"));

        let body: ErrorBody = serde_json::from_value(json!({"error": "Unauthorized"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Unauthorized"));

        let body: ErrorBody =
            serde_json::from_value(json!({"error": {"message": "Rate limit exceeded"}})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Rate limit exceeded"));

        let body: ErrorBody = serde_json::from_value(json!({"detail": "x"})).unwrap();
        assert_eq!(body.into_message(), None);
    }

    #[test]
    fn test_article_source_context() {
        let article: Article = serde_json::from_value(json!({
            "title": "Headline",
            "content": "Body",
            "publication_name": "Daily Planet",
            "bias_rating": "left-center"
        }))
        .unwrap();
        let context = article.source_context().expect("context present");
        assert_eq!(context.publication_name.as_deref(), Some("Daily Planet"));
        assert_eq!(context.bias_rating.as_deref(), Some("left-center"));
        assert_eq!(context.credibility_tier, None);

        assert_eq!(Article::default().source_context(), None);
    }

    #[test]
    fn test_article_tolerates_non_string_metadata() {
        let article: Article = serde_json::from_value(json!({
            "content": "Body",
            "credibility_tier": 3,
            "published_date": { "iso": "2024-05-01" },
            "author": null,
            "bias_rating": false,
            "publication_name": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(article.non_empty_content(), Some("Body"));
        assert_eq!(article.credibility_tier.as_deref(), Some("3"));
        assert_eq!(article.bias_rating.as_deref(), Some("false"));
        assert_eq!(article.published_date, None);
        assert_eq!(article.author, None);
        assert_eq!(article.publication_name, None);
    }

    #[test]
    fn test_article_non_empty_content() {
        let article = Article {
            content: Some("   ".to_string()),
            ..Article::default()
        };
        assert_eq!(article.non_empty_content(), None);

        let article = Article {
            content: Some("Text".to_string()),
            ..Article::default()
        };
        assert_eq!(article.non_empty_content(), Some("Text"));
    }

    #[test]
    fn test_job_kind_endpoint() {
        assert_eq!(JobKind::Scrape.endpoint(), "/scrape");
        assert_eq!(
            JobKind::Analysis(AnalysisMode::KeyClaims).endpoint(),
            "/key-claims"
        );
    }
}
