//! Supervision of per-playground dev commands.
//!
//! A [`ProcessSupervisor`] owns the in-memory registry of running commands,
//! one bounded [`LogBuffer`] per playground, and a broadcast channel of
//! [`DevEvent`]s. Nothing here is persisted.

pub mod events;
pub mod log_buffer;
pub mod resolve;
mod supervisor;
mod terminate;

pub use events::{exit_marker, DevEvent};
pub use log_buffer::{LogBuffer, LOG_CAPACITY};
pub use resolve::{resolve_command, CommandSource, ResolvedCommand};
pub use supervisor::{ProcessSupervisor, RunningProcess, StartOutcome};
