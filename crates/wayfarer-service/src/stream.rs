//! Wire protocol of the chat stream
//!
//! One JSON object per line. `status` lines report node progress, and the
//! stream ends after exactly one `answer` or `error` line, or with no
//! terminal line at all when the run suspended awaiting profile input (the
//! caller then re-invokes with the completed profile).

use serde::{Deserialize, Serialize};

use dialog_engine::DialogEvent;

/// A single line of the chat response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    Status { content: String },
    Answer { content: String },
    Error { content: String },
}

/// Map an engine event onto the wire protocol.
///
/// Events with no client-visible representation (run/node starts) map to
/// `None` and are dropped from the stream.
pub fn client_event(event: &DialogEvent) -> Option<ClientEvent> {
    match event {
        DialogEvent::NodeCompleted { node, note, .. } => Some(ClientEvent::Status {
            content: note
                .clone()
                .unwrap_or_else(|| format!("Completed {node}")),
        }),
        DialogEvent::RunSuspended { prompt, reason, .. } => Some(ClientEvent::Status {
            content: prompt.clone().unwrap_or_else(|| reason.clone()),
        }),
        DialogEvent::RunCompleted { answer, .. } => Some(ClientEvent::Answer {
            content: answer.clone().unwrap_or_default(),
        }),
        DialogEvent::RunFailed { kind, detail, .. } => Some(ClientEvent::Error {
            content: format!("{kind}: {detail}"),
        }),
        DialogEvent::RunStarted { .. } | DialogEvent::NodeStarted { .. } => None,
    }
}

/// Serialize a client event as one newline-terminated JSON line.
pub fn to_line(event: &ClientEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(format!("{json}\n")),
        Err(e) => {
            log::error!("failed to serialize client event: {e}");
            None
        }
    }
}
