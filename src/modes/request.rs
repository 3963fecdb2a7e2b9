//! Request payloads for analysis submissions.

use serde::{Deserialize, Serialize};

use super::AnalysisMode;

/// Credibility and provenance metadata about the source of the content.
///
/// Forwarded to the modes that accept auxiliary evidence about where the
/// content came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    /// Outlet name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_name: Option<String>,
    /// Outlet credibility tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credibility_tier: Option<String>,
    /// Outlet bias rating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias_rating: Option<String>,
    /// Outlet factual-reporting rating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factual_reporting: Option<String>,
}

impl SourceContext {
    /// True when no credibility field is set.
    pub fn is_empty(&self) -> bool {
        self.publication_name.is_none()
            && self.credibility_tier.is_none()
            && self.bias_rating.is_none()
            && self.factual_reporting.is_none()
    }
}

/// Body of a job-creation request.
///
/// Only `content` is always present; every other field is set by the
/// mode-specific rule in [`AnalysisRequest::for_mode`] and omitted otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisRequest {
    /// Text to analyze; always sent.
    pub content: String,
    /// Copy of the content, for modes that read `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Source URL (comprehensive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Source URL (bias analysis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_url: Option<String>,
    /// Source metadata (key claims, bias, lie detection).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_context: Option<SourceContext>,
    /// Source URL (manipulation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_info: Option<String>,
    /// Source metadata (manipulation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_credibility: Option<SourceContext>,
    /// Always `html` for LLM-output checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

impl AnalysisRequest {
    /// Create a request carrying only the content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Shape the payload for `mode`.
    ///
    /// | mode | extra fields |
    /// |---|---|
    /// | comprehensive | `source_url` |
    /// | key-claims | `source_context` |
    /// | bias-analysis | `text`, `publication_url`, `source_context` |
    /// | lie-detection | `text`, `source_context` |
    /// | manipulation | `source_info`, `source_credibility` |
    /// | llm-output | `input_type: "html"` |
    pub fn for_mode(
        mode: AnalysisMode,
        content: &str,
        source_url: Option<&str>,
        source_context: Option<&SourceContext>,
    ) -> Self {
        let url = source_url.map(str::to_string);
        let context = source_context.cloned();
        let request = Self::new(content);

        match mode {
            AnalysisMode::Comprehensive => Self {
                source_url: url,
                ..request
            },
            AnalysisMode::KeyClaims => Self {
                source_context: context,
                ..request
            },
            AnalysisMode::BiasAnalysis => Self {
                text: Some(content.to_string()),
                publication_url: url,
                source_context: context,
                ..request
            },
            AnalysisMode::LieDetection => Self {
                text: Some(content.to_string()),
                source_context: context,
                ..request
            },
            AnalysisMode::Manipulation => Self {
                source_info: url,
                source_credibility: context,
                ..request
            },
            // Citations are verified from the pasted text itself.
            AnalysisMode::LlmOutput => Self {
                input_type: Some("html".to_string()),
                ..request
            },
        }
    }

    /// Shape the payload for a mode given by name.
    ///
    /// Unrecognized names produce a content-only payload.
    pub fn for_mode_name(
        mode: &str,
        content: &str,
        source_url: Option<&str>,
        source_context: Option<&SourceContext>,
    ) -> Self {
        match mode.parse::<AnalysisMode>() {
            Ok(mode) => Self::for_mode(mode, content, source_url, source_context),
            Err(_) => Self::new(content),
        }
    }

    /// Serialize to a JSON body.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "content": self.content }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context() -> SourceContext {
        SourceContext {
            publication_name: Some("Daily Planet".to_string()),
            credibility_tier: Some("high".to_string()),
            bias_rating: Some("center".to_string()),
            factual_reporting: None,
        }
    }

    fn keys(value: &serde_json::Value) -> Vec<String> {
        let mut keys: Vec<String> = value
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    #[test]
    fn test_comprehensive_with_and_without_url() {
        let with_url =
            AnalysisRequest::for_mode(AnalysisMode::Comprehensive, "hello", Some("http://x"), None);
        assert_eq!(
            with_url.to_json(),
            json!({ "content": "hello", "source_url": "http://x" })
        );

        let without_url = AnalysisRequest::for_mode(AnalysisMode::Comprehensive, "hello", None, None);
        assert_eq!(without_url.to_json(), json!({ "content": "hello" }));
    }

    #[test]
    fn test_comprehensive_ignores_context() {
        let ctx = context();
        let body =
            AnalysisRequest::for_mode(AnalysisMode::Comprehensive, "hello", None, Some(&ctx));
        assert_eq!(body.to_json(), json!({ "content": "hello" }));
    }

    #[test]
    fn test_key_claims_carries_context_only() {
        let ctx = context();
        let body = AnalysisRequest::for_mode(
            AnalysisMode::KeyClaims,
            "claims",
            Some("http://x"),
            Some(&ctx),
        );
        assert_eq!(
            body.to_json(),
            json!({
                "content": "claims",
                "source_context": {
                    "publication_name": "Daily Planet",
                    "credibility_tier": "high",
                    "bias_rating": "center"
                }
            })
        );
    }

    #[test]
    fn test_bias_analysis_duplicates_text() {
        let ctx = context();
        let body = AnalysisRequest::for_mode(
            AnalysisMode::BiasAnalysis,
            "story",
            Some("http://news.example/a"),
            Some(&ctx),
        )
        .to_json();
        assert_eq!(body["text"], "story");
        assert_eq!(body["content"], "story");
        assert_eq!(body["publication_url"], "http://news.example/a");
        assert_eq!(
            keys(&body),
            vec!["content", "publication_url", "source_context", "text"]
        );
    }

    #[test]
    fn test_lie_detection_has_no_url() {
        let ctx = context();
        let body = AnalysisRequest::for_mode(
            AnalysisMode::LieDetection,
            "statement",
            Some("http://x"),
            Some(&ctx),
        )
        .to_json();
        assert_eq!(keys(&body), vec!["content", "source_context", "text"]);
    }

    #[test]
    fn test_manipulation_renames_fields() {
        let ctx = context();
        let body = AnalysisRequest::for_mode(
            AnalysisMode::Manipulation,
            "ad copy",
            Some("http://x"),
            Some(&ctx),
        )
        .to_json();
        assert_eq!(body["source_info"], "http://x");
        assert_eq!(body["source_credibility"]["credibility_tier"], "high");
        assert_eq!(keys(&body), vec!["content", "source_credibility", "source_info"]);
    }

    #[test]
    fn test_llm_output_never_attaches_source() {
        let ctx = context();
        let body = AnalysisRequest::for_mode(
            AnalysisMode::LlmOutput,
            "<p>cited</p>",
            Some("http://x"),
            Some(&ctx),
        );
        assert_eq!(
            body.to_json(),
            json!({ "content": "<p>cited</p>", "input_type": "html" })
        );
    }

    #[test]
    fn test_every_mode_includes_content() {
        let ctx = context();
        for mode in AnalysisMode::ALL {
            let body = AnalysisRequest::for_mode(mode, "c", Some("http://x"), Some(&ctx)).to_json();
            assert_eq!(body["content"], "c", "mode {} lost content", mode);
        }
    }

    #[test]
    fn test_unknown_mode_name_is_content_only() {
        let ctx = context();
        let body =
            AnalysisRequest::for_mode_name("sentiment", "c", Some("http://x"), Some(&ctx));
        assert_eq!(body.to_json(), json!({ "content": "c" }));

        let known = AnalysisRequest::for_mode_name("comprehensive", "c", Some("http://x"), None);
        assert_eq!(known.source_url.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_source_context_is_empty() {
        assert!(SourceContext::default().is_empty());
        assert!(!context().is_empty());
    }
}
