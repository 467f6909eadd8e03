//! Call sessions and the agent instances they run on.

mod bootstrap;
mod bridge;
mod prompt;

pub use bootstrap::{BootstrapError, CallAgent, PreparedSession, SessionFactory};
pub use bridge::{
    CallSession, CloseReason, SessionError, SessionState, SessionSummary, TranscriptEntry,
};
pub use prompt::{DEFAULT_INSTRUCTIONS, load_instructions};
