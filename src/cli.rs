//! Command-line driver for analysis sessions.
//!
//! Plays the presentation role: turns arguments into session intents, prints
//! the message log as it grows and reports the outcome.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::modes::AnalysisMode;
use crate::session::{AnalysisSessionController, Msg, SessionState};

/// Submit and follow analysis jobs.
#[derive(Parser, Debug)]
#[command(name = "analysis-jobs", version, about)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an analysis, optionally fetching the article at --url first
    Run {
        /// Analysis mode
        #[arg(long, default_value = "comprehensive")]
        mode: AnalysisMode,

        /// Content to analyze
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the content to analyze from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Source URL; fetched first when no content is given
        #[arg(long)]
        url: Option<String>,
    },

    /// List analysis modes and their endpoints
    Modes,
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, config: &Config) -> CliResult {
    match command {
        Commands::Run {
            mode,
            text,
            file,
            url,
        } => execute_run(config, mode, text, file, url).await,
        Commands::Modes => execute_modes(),
    }
}

fn execute_modes() -> CliResult {
    let mut output = String::new();
    for mode in AnalysisMode::ALL {
        output.push_str(&format!("{:<15} {}\n", mode.as_str(), mode.endpoint()));
    }
    CliResult::success(output)
}

async fn execute_run(
    config: &Config,
    mode: AnalysisMode,
    text: Option<String>,
    file: Option<PathBuf>,
    url: Option<String>,
) -> CliResult {
    let content = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                return CliResult::error(format!("Failed to read {}: {}", path.display(), e))
            }
        },
        (None, None) => String::new(),
    };

    let mut controller = match AnalysisSessionController::from_config(config) {
        Ok(controller) => controller,
        Err(e) => return CliResult::error(e.to_string()),
    };

    controller.dispatch(Msg::ModeSelected(mode));
    controller.dispatch(Msg::ContentEdited(content));
    if let Some(url) = url {
        controller.dispatch(Msg::UrlEdited(url));
    }

    if controller.view().content.trim().is_empty() {
        if !controller.session().can_fetch() {
            return CliResult::error("Nothing to analyze: pass --text, --file or --url");
        }
        controller.dispatch(Msg::FetchUrlClicked);
        match drive(&mut controller).await {
            // cancelled before the article arrived
            SessionState::Idle if controller.session().article().is_none() => {
                return outcome(&controller, SessionState::Idle);
            }
            SessionState::Idle if !controller.session().can_analyze() => {
                return CliResult::error("Fetched article has no content to analyze");
            }
            SessionState::Idle => {}
            state => return outcome(&controller, state),
        }
    }

    info!(mode = %mode, "Starting analysis");
    controller.dispatch(Msg::AnalyzeClicked);
    let state = drive(&mut controller).await;
    outcome(&controller, state)
}

/// Run the active flow to the end, echoing log lines and honouring Ctrl-C.
async fn drive(controller: &mut AnalysisSessionController) -> SessionState {
    let mut printed = 0;
    for line in controller.view().messages.iter() {
        eprintln!("  {}", line);
        printed += 1;
    }

    while controller.state().is_busy() {
        let interrupted = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            _ = controller.process_next() => false,
        };
        if interrupted {
            eprintln!("Cancelling...");
            controller.dispatch(Msg::CancelClicked);
            break;
        }

        let messages = controller.view().messages;
        if messages.len() < printed {
            printed = 0;
        }
        for line in &messages[printed..] {
            eprintln!("  {}", line);
        }
        printed = messages.len();
    }

    controller.state()
}

fn outcome(controller: &AnalysisSessionController, state: SessionState) -> CliResult {
    let view = controller.view();
    match state {
        SessionState::Done => {
            let result = view.result.unwrap_or(serde_json::Value::Null);
            match serde_json::to_string_pretty(&result) {
                Ok(json) => CliResult::success(json),
                Err(e) => CliResult::error(format!("Failed to render result: {}", e)),
            }
        }
        SessionState::Error => CliResult::error(
            view.error
                .unwrap_or_else(|| "Analysis failed".to_string()),
        ),
        SessionState::Idle => CliResult {
            exit_code: 130,
            message: "Cancelled".to_string(),
        },
        other => CliResult::error(format!("Session stopped in state {}", other)),
    }
}
