//! # Analysis Jobs
//!
//! Client and session orchestration for long-running analysis jobs: submit a
//! request to the analysis backend, follow its progress over a Server-Sent
//! Events stream, fetch the result once it completes, or cancel it.
//!
//! ## Features
//!
//! - **Request shaping**: one payload rule per [`modes::AnalysisMode`]
//! - **Job API client**: submission, result retrieval and best-effort cancellation
//! - **Event streaming**: SSE subscriptions with bounded exponential reconnect backoff
//! - **Session state machine**: fetch-URL and analyze flows with cancel/retry/reset
//!
//! ## Architecture
//!
//! ```text
//! intent ─▶ AnalysisSessionController ─▶ JobClient::submit ─▶ JobStream ─▶ JobClient::fetch_result
//!                   ▲                                            │
//!                   └──────────── Msg (inbox) ◀──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use analysis_jobs::{AnalysisSessionController, Config, Msg};
//! use analysis_jobs::modes::AnalysisMode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let mut controller = AnalysisSessionController::from_config(&config)?;
//!     controller.dispatch(Msg::ModeSelected(AnalysisMode::BiasAnalysis));
//!     controller.dispatch(Msg::ContentEdited("Text to analyze".to_string()));
//!     controller.dispatch(Msg::AnalyzeClicked);
//!     controller.settle().await;
//!     println!("{:?}", controller.view().result);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line driver.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Backend job API client and event streaming.
pub mod jobs;
/// Analysis modes and request payloads.
pub mod modes;
/// Session state machine and controller.
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult, JobError, JobResult};
pub use session::{AnalysisSessionController, Msg, SessionState, SessionView};
