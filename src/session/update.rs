use serde_json::json;
use tracing::{debug, info, warn};

use super::{Effect, Msg, Session, SessionState};
use crate::jobs::{Article, JobKind};
use crate::modes::AnalysisRequest;

/// Pure update function: applies a message to a session and returns any effects.
pub fn update(mut session: Session, msg: Msg) -> (Session, Vec<Effect>) {
    let effects = match msg {
        Msg::ContentEdited(content) => {
            session.set_content(content);
            Vec::new()
        }
        Msg::UrlEdited(url) => {
            session.set_url(url);
            Vec::new()
        }
        Msg::ModeSelected(mode) => {
            session.set_mode(mode);
            Vec::new()
        }
        Msg::FetchUrlClicked => start_fetch(&mut session),
        Msg::AnalyzeClicked => start_analysis(&mut session),
        Msg::CancelClicked => {
            if !session.state().is_busy() {
                return (session, Vec::new());
            }
            let mut effects = vec![Effect::Unsubscribe];
            if let Some(job_id) = session.take_flow().and_then(|flow| flow.job_id) {
                info!(job_id = %job_id, "Cancelling job");
                effects.push(Effect::CancelJob { job_id });
            }
            session.clear_messages();
            session.set_state(SessionState::Idle);
            effects
        }
        Msg::RetryClicked => {
            if session.state() == SessionState::Error {
                session.set_error(None);
                session.set_state(SessionState::Idle);
            }
            Vec::new()
        }
        Msg::AnalyzeAnotherClicked => {
            if session.state() == SessionState::Done {
                session.set_content(String::new());
                session.set_url(String::new());
                session.set_article(None);
                session.set_result(None);
                session.set_error(None);
                session.clear_messages();
                session.set_state(SessionState::Idle);
            }
            Vec::new()
        }
        Msg::JobSubmitted { flow, job_id } => match session.flow_mut(flow) {
            Some(active) => {
                active.job_id = Some(job_id.clone());
                vec![Effect::Subscribe { flow, job_id }]
            }
            None => {
                // The flow was cancelled while its submission was in flight.
                debug!(job_id = %job_id, flow, "Job submitted for a stale flow");
                vec![Effect::CancelJob { job_id }]
            }
        },
        Msg::StreamMessage { flow, text } => {
            if session.flow_mut(flow).is_some() {
                session.push_message(text);
            }
            Vec::new()
        }
        Msg::StreamCompleted { flow } => {
            match session.flow_mut(flow).and_then(|active| active.job_id.clone()) {
                Some(job_id) => vec![Effect::Unsubscribe, Effect::FetchResult { flow, job_id }],
                None => Vec::new(),
            }
        }
        Msg::ResultFetched { flow, result } => finish_flow(&mut session, flow, result),
        Msg::FlowFailed { flow, message } => {
            if session.flow_mut(flow).is_none() {
                return (session, Vec::new());
            }
            warn!(flow, error = %message, "Flow failed");
            session.take_flow();
            session.set_error(Some(message));
            session.set_state(SessionState::Error);
            vec![Effect::Unsubscribe]
        }
    };

    (session, effects)
}

fn start_fetch(session: &mut Session) -> Vec<Effect> {
    if !session.can_fetch() {
        return Vec::new();
    }
    let url = session.url().trim().to_string();
    let flow = session.begin_flow(SessionState::Fetching, JobKind::Scrape);
    session.push_message(format!("Fetching article from {}...", url));

    vec![Effect::Submit {
        flow,
        kind: JobKind::Scrape,
        payload: json!({ "url": url }),
    }]
}

fn start_analysis(session: &mut Session) -> Vec<Effect> {
    if !session.can_analyze() {
        return Vec::new();
    }
    let mode = session.mode();
    let source_url = Some(session.url().trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    let source_context = session.article().and_then(Article::source_context);
    let payload = AnalysisRequest::for_mode(
        mode,
        session.content(),
        source_url.as_deref(),
        source_context.as_ref(),
    )
    .to_json();

    session.set_result(None);
    let flow = session.begin_flow(SessionState::Analyzing, JobKind::Analysis(mode));

    vec![Effect::Submit {
        flow,
        kind: JobKind::Analysis(mode),
        payload,
    }]
}

fn finish_flow(session: &mut Session, flow: u64, result: serde_json::Value) -> Vec<Effect> {
    let kind = match session.flow_mut(flow) {
        Some(active) => active.kind,
        None => return Vec::new(),
    };
    session.take_flow();

    match kind {
        JobKind::Scrape => match serde_json::from_value::<Article>(result) {
            Ok(article) => {
                if let Some(content) = article.non_empty_content() {
                    session.set_content(content.to_string());
                }
                info!(title = ?article.title, "Article fetched");
                session.set_article(Some(article));
                session.clear_messages();
                session.set_state(SessionState::Idle);
            }
            Err(e) => {
                session.set_error(Some(format!("Invalid article payload: {}", e)));
                session.set_state(SessionState::Error);
            }
        },
        JobKind::Analysis(mode) => {
            info!(mode = %mode, "Analysis finished");
            session.set_result(Some(result));
            session.set_state(SessionState::Done);
        }
    }
    Vec::new()
}
