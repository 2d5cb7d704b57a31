use serde::{Deserialize, Serialize};

use playground_core::PlaygroundId;

/// Broadcast channel depth; slow subscribers past this lag and skip events.
pub const EVENT_CAPACITY: usize = 1024;

/// Live notification from a supervised dev command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DevEvent {
    Log {
        id: PlaygroundId,
        chunk: String,
    },
    Exit {
        id: PlaygroundId,
        code: Option<i32>,
        signal: Option<String>,
    },
}

impl DevEvent {
    pub fn id(&self) -> &PlaygroundId {
        match self {
            DevEvent::Log { id, .. } | DevEvent::Exit { id, .. } => id,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, DevEvent::Exit { .. })
    }
}

/// Line appended to the log when the process terminates.
pub fn exit_marker(code: Option<i32>, signal: Option<&str>) -> String {
    let code = code.map_or_else(|| "null".to_string(), |c| c.to_string());
    let signal = signal.unwrap_or("null");
    format!("\n[process exited code={code} signal={signal}]\n")
}
