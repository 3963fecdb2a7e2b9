use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// A job operation failed.
    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

/// Errors raised while submitting, streaming, fetching or cancelling a job.
///
/// The display string of each variant is what a session surfaces to the user,
/// so variants that carry a server message display that message verbatim.
#[derive(Debug, Error)]
pub enum JobError {
    /// No response could be obtained from the backend.
    #[error("Network error: {message}")]
    Network {
        /// Transport error text.
        message: String,
    },

    /// Backend answered with a non-2xx status.
    #[error("{message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Server message, or `Request failed: <status>`.
        message: String,
    },

    /// The event channel failed at the transport level.
    #[error("Stream transport error: {message}")]
    StreamTransport {
        /// What went wrong on the channel.
        message: String,
    },

    /// The backend reported `status: failed` for the job.
    #[error("{message}")]
    JobFailed {
        /// Server failure text, or a generic one.
        message: String,
    },

    /// The backend reported `status: cancelled` for the job.
    #[error("Analysis was cancelled")]
    JobCancelled,

    /// The event channel could not be re-established.
    #[error("Connection lost")]
    ReconnectExhausted {
        /// Reopen attempts spent.
        attempts: u32,
    },

    /// A 2xx response whose body could not be understood.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Parse failure detail.
        message: String,
    },

    /// The configured base URL cannot have job paths appended to it.
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
    },
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        JobError::Network {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for job API operations
pub type JobResult<T> = Result<T, JobError>;
