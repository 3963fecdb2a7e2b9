use crate::modes::AnalysisMode;

/// Everything that can change a session: user intents and flow completions.
///
/// Completion variants carry the sequence number of the flow they belong to;
/// the update function ignores those whose flow is no longer active.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the content box.
    ContentEdited(String),
    /// User edited the URL box.
    UrlEdited(String),
    /// User picked an analysis mode.
    ModeSelected(AnalysisMode),
    /// User asked to fetch the article at the current URL.
    FetchUrlClicked,
    /// User asked to analyze the current content.
    AnalyzeClicked,
    /// User cancelled the flow in flight.
    CancelClicked,
    /// User dismissed an error.
    RetryClicked,
    /// User started over after a finished analysis.
    AnalyzeAnotherClicked,
    /// Submission returned a job id.
    JobSubmitted {
        /// Flow that submitted.
        flow: u64,
        /// Server-assigned id.
        job_id: String,
    },
    /// Stream delivered a progress message.
    StreamMessage {
        /// Flow the stream belongs to.
        flow: u64,
        /// Message text.
        text: String,
    },
    /// Stream reported completion.
    StreamCompleted {
        /// Flow the stream belongs to.
        flow: u64,
    },
    /// Result payload arrived.
    ResultFetched {
        /// Flow the result belongs to.
        flow: u64,
        /// Unwrapped result body.
        result: serde_json::Value,
    },
    /// Submission, stream or result fetch failed.
    FlowFailed {
        /// Flow that failed.
        flow: u64,
        /// Error display text.
        message: String,
    },
}
