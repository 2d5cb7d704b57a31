//! Best-effort cleanup steps.
//!
//! Deletion runs several independent steps (stop the dev command, run the
//! app's delete hook, remove the directory, stop/remove the container). Each
//! goes through [`best_effort`]: the outcome is recorded and logged, and the
//! workflow continues regardless.

use serde::{Deserialize, Serialize};

use playground_core::{PlaygroundError, PlaygroundId};

/// What happened to one cleanup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStep {
    pub step: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Record of a delete: every attempted step, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub id: PlaygroundId,
    pub steps: Vec<CleanupStep>,
}

impl DeleteReport {
    pub fn new(id: PlaygroundId) -> Self {
        Self {
            id,
            steps: Vec::new(),
        }
    }

    pub fn skip(&mut self, step: &str, reason: impl Into<String>) {
        self.steps.push(CleanupStep {
            step: step.to_string(),
            outcome: StepOutcome::Skipped {
                reason: reason.into(),
            },
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &CleanupStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    pub fn outcome_of(&self, step: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.outcome)
    }
}

/// Run `f`, recording its outcome under `step`. Never propagates the error.
pub fn best_effort<T, F>(report: &mut DeleteReport, step: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, PlaygroundError>,
{
    match f() {
        Ok(value) => {
            tracing::debug!(id = %report.id, step, "cleanup step done");
            report.steps.push(CleanupStep {
                step: step.to_string(),
                outcome: StepOutcome::Done,
            });
            Some(value)
        }
        Err(err) => {
            tracing::warn!(id = %report.id, step, error = %err, "cleanup step failed; continuing");
            report.steps.push(CleanupStep {
                step: step.to_string(),
                outcome: StepOutcome::Failed {
                    error: err.to_string(),
                },
            });
            None
        }
    }
}
