//! Analysis session state machine.
//!
//! A session runs at most one flow at a time:
//!
//! ```text
//!            fetch ──▶ Fetching ──complete──▶ Idle (article stored)
//!          ╱              │
//!     Idle                ├──error──▶ Error ──retry──▶ Idle
//!          ╲              │
//!            analyze ─▶ Analyzing ──complete──▶ Done ──analyze another──▶ Idle
//!
//!     Fetching | Analyzing ──cancel──▶ Idle
//! ```
//!
//! [`update`] is the pure transition function; [`AnalysisSessionController`]
//! executes the [`Effect`]s it returns and feeds completions back as [`Msg`]s.

mod controller;
mod effect;
mod msg;
mod state;
mod update;

pub use controller::AnalysisSessionController;
pub use effect::Effect;
pub use msg::Msg;
pub use state::{ActiveFlow, Session, SessionState, SessionView};
pub use update::update;
