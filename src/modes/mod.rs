//! Analysis mode definitions.
//!
//! Each [`AnalysisMode`] maps to exactly one submission endpoint and one
//! payload-shaping rule (see [`AnalysisRequest::for_mode`]).

mod request;

pub use request::*;

use serde::{Deserialize, Serialize};

/// Analysis mode types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Full-spectrum analysis of the content.
    #[default]
    Comprehensive,
    /// Extraction and verification of key claims.
    KeyClaims,
    /// Political and framing bias analysis.
    BiasAnalysis,
    /// Deception indicator detection.
    LieDetection,
    /// Manipulation technique detection.
    Manipulation,
    /// Citation verification of pasted LLM output.
    LlmOutput,
}

impl AnalysisMode {
    /// Every mode, in presentation order.
    pub const ALL: [AnalysisMode; 6] = [
        AnalysisMode::Comprehensive,
        AnalysisMode::KeyClaims,
        AnalysisMode::BiasAnalysis,
        AnalysisMode::LieDetection,
        AnalysisMode::Manipulation,
        AnalysisMode::LlmOutput,
    ];

    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "comprehensive",
            AnalysisMode::KeyClaims => "key-claims",
            AnalysisMode::BiasAnalysis => "bias-analysis",
            AnalysisMode::LieDetection => "lie-detection",
            AnalysisMode::Manipulation => "manipulation",
            AnalysisMode::LlmOutput => "llm-output",
        }
    }

    /// Submission endpoint path, relative to the configured base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "/comprehensive-analysis",
            AnalysisMode::KeyClaims => "/key-claims",
            AnalysisMode::BiasAnalysis => "/bias",
            AnalysisMode::LieDetection => "/lie-detection",
            AnalysisMode::Manipulation => "/manipulation",
            AnalysisMode::LlmOutput => "/check",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comprehensive" => Ok(AnalysisMode::Comprehensive),
            "key-claims" => Ok(AnalysisMode::KeyClaims),
            "bias-analysis" => Ok(AnalysisMode::BiasAnalysis),
            "lie-detection" => Ok(AnalysisMode::LieDetection),
            "manipulation" => Ok(AnalysisMode::Manipulation),
            "llm-output" => Ok(AnalysisMode::LlmOutput),
            _ => Err(format!("Unknown analysis mode: {}", s)),
        }
    }
}
