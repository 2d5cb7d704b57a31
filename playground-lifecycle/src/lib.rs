//! # playground-lifecycle
//!
//! Creation and deletion workflows for playgrounds, driven through the
//! external `git` and container-runtime CLIs, plus the editor/terminal
//! launchers. Everything hangs off [`Playgrounds`].

pub mod cleanup;
mod container;
pub mod launch;
pub mod naming;
mod repo;
mod service;
pub mod status;

pub use cleanup::{best_effort, CleanupStep, DeleteReport, StepOutcome};
pub use container::NewContainer;
pub use repo::NewRepo;
pub use service::{PathsInfo, Playgrounds};
pub use status::StatusProber;
