//! Dialog Engine - graph-based conversational workflow execution for Wayfarer
//!
//! This crate provides the stateful, cyclic execution core of the Wayfarer
//! question-answering service. It knows nothing about retrieval or language
//! models; it executes a fixed graph of typed nodes over a
//! [`ConversationState`], with:
//!
//! - Conditional routing via pure selectors over the state
//! - Bounded cycles (visit caps with forced forward progress)
//! - Suspension for human-in-the-loop turns (missing profile data)
//! - An ordered event stream per run
//! - Cooperative cancellation between node boundaries
//!
//! # Architecture
//!
//! Nodes implement [`DialogNode`] and return a [`StepDelta`]: the typed state
//! changes of the step plus a tagged [`StepOutcome`] that the executor and
//! the routing table dispatch on. Graphs are assembled with
//! [`DialogGraphBuilder`], validated at build time, and shared immutably
//! across concurrent runs.

pub mod delta;
pub mod error;
pub mod events;
pub mod executor;
pub mod graph;
pub mod state;

// Re-export key types
pub use delta::{FailureKind, StepDelta, StepOutcome};
pub use error::{EngineError, Result};
pub use events::{ChannelEventSink, DialogEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use executor::{CancelFlag, ExecutorConfig, GraphExecutor, RunReport, RunStatus};
pub use graph::{DialogGraph, DialogGraphBuilder, DialogNode, RouteSelector, Routing};
pub use state::{ConversationState, Message, Passage, Role};
