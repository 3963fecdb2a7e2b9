use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::{update, Effect, Msg, Session, SessionState, SessionView};
use crate::config::Config;
use crate::error::{JobError, JobResult};
use crate::jobs::{HttpEventSource, JobApi, JobClient, JobStream, StreamHandler, Subscription};

/// Forwards stream callbacks into the controller's inbox, tagged with the flow.
struct InboxHandler {
    flow: u64,
    inbox: mpsc::UnboundedSender<Msg>,
}

impl StreamHandler for InboxHandler {
    fn on_message(&mut self, text: String) {
        let _ = self.inbox.send(Msg::StreamMessage {
            flow: self.flow,
            text,
        });
    }

    fn on_complete(&mut self) {
        let _ = self.inbox.send(Msg::StreamCompleted { flow: self.flow });
    }

    fn on_error(&mut self, error: JobError) {
        let _ = self.inbox.send(Msg::FlowFailed {
            flow: self.flow,
            message: error.to_string(),
        });
    }
}

/// Drives one analysis session over the job API.
///
/// All session state is owned here and changed only through [`update`].
/// Network calls run on spawned tasks that post their outcome back to the
/// controller's inbox, so the caller decides when completions are applied
/// (see [`AnalysisSessionController::process_next`]).
pub struct AnalysisSessionController {
    session: Session,
    api: Arc<dyn JobApi>,
    stream: JobStream,
    subscription: Option<Subscription>,
    inbox_tx: mpsc::UnboundedSender<Msg>,
    inbox: mpsc::UnboundedReceiver<Msg>,
}

impl AnalysisSessionController {
    /// Create a controller over an API client and a stream client.
    pub fn new(api: Arc<dyn JobApi>, stream: JobStream) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            api,
            stream,
            subscription: None,
            inbox_tx,
            inbox,
        }
    }

    /// Create a controller talking HTTP to the configured backend.
    pub fn from_config(config: &Config) -> JobResult<Self> {
        let client = JobClient::new(&config.api, &config.request)?;
        let source = HttpEventSource::new(client.http().clone(), &config.api)?;
        let stream = JobStream::new(Arc::new(source), config.stream.clone());
        Ok(Self::new(Arc::new(client), stream))
    }

    /// Session as last updated.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Presentation snapshot.
    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Whether a stream subscription is currently held.
    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply a message and run the effects it produces.
    pub fn dispatch(&mut self, msg: Msg) {
        let session = std::mem::take(&mut self.session);
        let (session, effects) = update(session, msg);
        self.session = session;

        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Wait for the next flow completion and apply it.
    pub async fn process_next(&mut self) {
        if let Some(msg) = self.inbox.recv().await {
            self.dispatch(msg);
        }
    }

    /// Apply completions until no flow is in flight.
    pub async fn settle(&mut self) -> SessionState {
        while self.session.state().is_busy() {
            self.process_next().await;
        }
        self.session.state()
    }

    fn close_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Submit {
                flow,
                kind,
                payload,
            } => {
                let api = self.api.clone();
                let inbox = self.inbox_tx.clone();
                tokio::spawn(async move {
                    let msg = match api.submit(kind.endpoint(), &payload).await {
                        Ok(job_id) => Msg::JobSubmitted { flow, job_id },
                        Err(e) => Msg::FlowFailed {
                            flow,
                            message: e.to_string(),
                        },
                    };
                    let _ = inbox.send(msg);
                });
            }
            Effect::Subscribe { flow, job_id } => {
                self.close_subscription();
                let handler = InboxHandler {
                    flow,
                    inbox: self.inbox_tx.clone(),
                };
                self.subscription = Some(self.stream.subscribe(job_id, handler));
            }
            Effect::Unsubscribe => self.close_subscription(),
            Effect::CancelJob { job_id } => {
                let api = self.api.clone();
                tokio::spawn(async move {
                    api.cancel(&job_id).await;
                });
            }
            Effect::FetchResult { flow, job_id } => {
                debug!(job_id = %job_id, flow, "Fetching result");
                let api = self.api.clone();
                let inbox = self.inbox_tx.clone();
                tokio::spawn(async move {
                    let msg = match api.fetch_result(&job_id).await {
                        Ok(result) => Msg::ResultFetched { flow, result },
                        Err(e) => Msg::FlowFailed {
                            flow,
                            message: e.to_string(),
                        },
                    };
                    let _ = inbox.send(msg);
                });
            }
        }
    }
}
