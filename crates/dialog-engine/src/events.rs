//! Event types for streaming run progress
//!
//! Events are sent from the executor to any consumer (an HTTP response
//! stream, a test capture, a log) to report node progress and the run's
//! final disposition. Emission order follows node-completion order exactly.

use serde::{Deserialize, Serialize};

use crate::delta::FailureKind;

/// Trait for sending dialog events
///
/// This abstracts over the transport mechanism (mpsc channel, test vector,
/// etc.) allowing the executor to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: DialogEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted during a dialog run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DialogEvent {
    /// Run started
    #[serde(rename_all = "camelCase")]
    RunStarted { run_id: String, graph: String },

    /// A node started executing
    #[serde(rename_all = "camelCase")]
    NodeStarted { run_id: String, node: String },

    /// A node completed
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        run_id: String,
        node: String,
        note: Option<String>,
    },

    /// Run suspended awaiting caller input (non-terminal)
    #[serde(rename_all = "camelCase")]
    RunSuspended {
        run_id: String,
        node: String,
        reason: String,
        /// The assistant prompt the caller should answer, if one was produced.
        prompt: Option<String>,
    },

    /// Run completed successfully
    #[serde(rename_all = "camelCase")]
    RunCompleted {
        run_id: String,
        answer: Option<String>,
    },

    /// Run failed terminally
    #[serde(rename_all = "camelCase")]
    RunFailed {
        run_id: String,
        kind: FailureKind,
        detail: String,
    },
}

impl DialogEvent {
    /// Check if this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DialogEvent::RunCompleted { .. }
                | DialogEvent::RunFailed { .. }
                | DialogEvent::RunSuspended { .. }
        )
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: DialogEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted in order.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<DialogEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<DialogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: DialogEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// An event sink backed by an unbounded tokio channel
///
/// The sending half lives with the executor; the receiving half feeds a
/// client-facing stream.
pub struct ChannelEventSink {
    sender: tokio::sync::mpsc::UnboundedSender<DialogEvent>,
}

impl ChannelEventSink {
    pub fn new(sender: tokio::sync::mpsc::UnboundedSender<DialogEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: DialogEvent) -> Result<(), EventError> {
        self.sender
            .send(event)
            .map_err(|_| EventError::channel_closed())
    }
}
