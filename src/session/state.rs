use serde::Serialize;

use crate::jobs::{Article, JobKind};
use crate::modes::AnalysisMode;

/// Lifecycle state of an analysis session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for an intent.
    #[default]
    Idle,
    /// Fetch-URL flow in flight.
    Fetching,
    /// Analysis flow in flight.
    Analyzing,
    /// Analysis result available.
    Done,
    /// Last flow failed; `error` holds why.
    Error,
}

impl SessionState {
    /// Whether a flow is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Fetching | SessionState::Analyzing)
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Fetching => "fetching",
            SessionState::Analyzing => "analyzing",
            SessionState::Done => "done",
            SessionState::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The flow currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFlow {
    /// Sequence number; completions carrying another number are stale.
    pub seq: u64,
    /// What the flow submitted.
    pub kind: JobKind,
    /// Known once submission succeeded.
    pub job_id: Option<String>,
}

/// All state of one analysis session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    state: SessionState,
    mode: AnalysisMode,
    content: String,
    url: String,
    messages: Vec<String>,
    article: Option<Article>,
    result: Option<serde_json::Value>,
    error: Option<String>,
    flow: Option<ActiveFlow>,
    last_seq: u64,
}

impl Session {
    /// Fresh idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Selected analysis mode.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Content to analyze.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Source URL, possibly empty.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Message log of the current flow, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Article from the last successful fetch.
    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    /// Result of the last finished analysis.
    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    /// Message of the last failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Flow in flight, if any.
    pub fn active_flow(&self) -> Option<&ActiveFlow> {
        self.flow.as_ref()
    }

    /// Analyze is enabled only from idle with non-blank content.
    pub fn can_analyze(&self) -> bool {
        self.state == SessionState::Idle && !self.content.trim().is_empty()
    }

    /// Fetch is enabled only from idle with a non-blank URL.
    pub fn can_fetch(&self) -> bool {
        self.state == SessionState::Idle && !self.url.trim().is_empty()
    }

    /// Cancel is enabled while a flow is in flight.
    pub fn can_cancel(&self) -> bool {
        self.state.is_busy()
    }

    /// Snapshot for presentation.
    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            mode: self.mode,
            content: self.content.clone(),
            url: self.url.clone(),
            messages: self.messages.clone(),
            article: self.article.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            can_analyze: self.can_analyze(),
            can_fetch: self.can_fetch(),
            can_cancel: self.can_cancel(),
        }
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = url;
    }

    pub(crate) fn set_mode(&mut self, mode: AnalysisMode) {
        self.mode = mode;
    }

    pub(crate) fn push_message(&mut self, message: String) {
        self.messages.push(message);
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Enter a busy state for a new flow and return its sequence number.
    pub(crate) fn begin_flow(&mut self, state: SessionState, kind: JobKind) -> u64 {
        self.last_seq += 1;
        self.state = state;
        self.error = None;
        self.messages.clear();
        self.flow = Some(ActiveFlow {
            seq: self.last_seq,
            kind,
            job_id: None,
        });
        self.last_seq
    }

    /// The active flow, if `seq` still identifies it.
    pub(crate) fn flow_mut(&mut self, seq: u64) -> Option<&mut ActiveFlow> {
        self.flow.as_mut().filter(|flow| flow.seq == seq)
    }

    pub(crate) fn take_flow(&mut self) -> Option<ActiveFlow> {
        self.flow.take()
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub(crate) fn set_result(&mut self, result: Option<serde_json::Value>) {
        self.result = result;
    }

    pub(crate) fn set_article(&mut self, article: Option<Article>) {
        self.article = article;
    }
}

/// Read-only view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    /// Lifecycle state.
    pub state: SessionState,
    /// Selected mode.
    pub mode: AnalysisMode,
    /// Content to analyze.
    pub content: String,
    /// Source URL.
    pub url: String,
    /// Progress log of the current flow.
    pub messages: Vec<String>,
    /// Fetched article.
    pub article: Option<Article>,
    /// Analysis result.
    pub result: Option<serde_json::Value>,
    /// Failure message.
    pub error: Option<String>,
    /// See [`Session::can_analyze`].
    pub can_analyze: bool,
    /// See [`Session::can_fetch`].
    pub can_fetch: bool,
    /// See [`Session::can_cancel`].
    pub can_cancel: bool,
}
