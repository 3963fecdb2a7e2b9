use crate::jobs::JobKind;

/// Side effects requested by [`super::update`], executed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create a job for `flow`.
    Submit {
        /// Flow the submission belongs to.
        flow: u64,
        /// Decides the endpoint.
        kind: JobKind,
        /// JSON request body.
        payload: serde_json::Value,
    },
    /// Open the stream for `job_id`, closing any open one first.
    Subscribe {
        /// Flow the stream events are tagged with.
        flow: u64,
        /// Job to follow.
        job_id: String,
    },
    /// Close the open stream, if any.
    Unsubscribe,
    /// Best-effort server-side cancel; outcome is never reported back.
    CancelJob {
        /// Job to cancel.
        job_id: String,
    },
    /// Retrieve the result of a completed job.
    FetchResult {
        /// Flow the result belongs to.
        flow: u64,
        /// Completed job.
        job_id: String,
    },
}
