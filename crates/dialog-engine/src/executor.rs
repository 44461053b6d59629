//! Dialog graph executor.
//!
//! Drives a [`DialogGraph`] to completion, suspension, failure, or
//! cancellation: run the current node, merge its delta into the state, emit
//! one event per completed node, then follow the routing table. The executor
//! has no domain knowledge; everything it needs to route lives in the state
//! and the graph.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::delta::{FailureKind, StepOutcome};
use crate::error::{EngineError, Result};
use crate::events::{DialogEvent, EventSink};
use crate::graph::{DialogGraph, Routing};
use crate::state::ConversationState;

/// Cooperative cancellation flag, checked between node boundaries.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The run stops before its next node.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executor tuning knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum visits of any single node per run. When a conditional route
    /// selects a node already visited this many times, the executor treats
    /// the cycle as satisfied and proceeds with the next declared target.
    pub max_cycle_visits: u32,
    /// Hard backstop on total steps per run.
    pub max_steps: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_cycle_visits: 3,
            max_steps: 64,
        }
    }
}

/// Final disposition of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// An answer was produced.
    Completed,
    /// Awaiting caller input (e.g. missing profile fields). Non-terminal.
    Suspended { reason: String },
    /// Unrecoverable failure.
    Failed { kind: FailureKind, detail: String },
    /// Abandoned between node boundaries. Neither done nor failed.
    Cancelled,
}

/// Outcome of one executor run: disposition plus the final state.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    /// Number of node executions performed.
    pub steps: u32,
    pub state: ConversationState,
}

/// Executor for dialog graphs.
///
/// Stateless between runs; safe to share behind `Arc` and invoke
/// re-entrantly with disjoint states.
pub struct GraphExecutor {
    config: ExecutorConfig,
}

impl GraphExecutor {
    pub fn new() -> Self {
        Self {
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Execute a graph to completion, suspension, or failure.
    pub async fn run(
        &self,
        graph: &DialogGraph,
        state: ConversationState,
        sink: &dyn EventSink,
    ) -> Result<RunReport> {
        self.run_cancellable(graph, state, sink, &CancelFlag::new())
            .await
    }

    /// Execute a graph, checking the cancel flag between node boundaries.
    ///
    /// A cancelled run emits no further events and reports
    /// [`RunStatus::Cancelled`].
    pub async fn run_cancellable(
        &self,
        graph: &DialogGraph,
        mut state: ConversationState,
        sink: &dyn EventSink,
        cancel: &CancelFlag,
    ) -> Result<RunReport> {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let mut visits: HashMap<String, u32> = HashMap::new();
        let mut steps: u32 = 0;
        let mut current = graph.start().to_string();

        let _ = sink.send(DialogEvent::RunStarted {
            run_id: run_id.clone(),
            graph: graph.name().to_string(),
        });

        loop {
            if cancel.is_cancelled() {
                log::info!("{run_id}: cancelled after {steps} steps");
                return Ok(RunReport {
                    run_id,
                    status: RunStatus::Cancelled,
                    steps,
                    state,
                });
            }

            if steps >= self.config.max_steps {
                return Err(EngineError::StepLimitExceeded(self.config.max_steps));
            }

            let node = graph
                .node(&current)
                .ok_or_else(|| EngineError::UnknownNode(current.clone()))?;

            let _ = sink.send(DialogEvent::NodeStarted {
                run_id: run_id.clone(),
                node: current.clone(),
            });

            steps += 1;
            *visits.entry(current.clone()).or_insert(0) += 1;

            // A node erroring out (rather than reporting a typed failure)
            // still halts the run as a failure, never a panic or a retry.
            let delta = match node.run(&state).await {
                Ok(delta) => delta,
                Err(e) => {
                    log::error!("{run_id}: node '{current}' errored: {e}");
                    crate::delta::StepDelta::failed(FailureKind::Internal, e.to_string())
                }
            };

            state.apply(&delta);
            log::debug!("{run_id}: node '{current}' completed");

            let _ = sink.send(DialogEvent::NodeCompleted {
                run_id: run_id.clone(),
                node: current.clone(),
                note: delta.note.clone(),
            });

            match delta.outcome {
                StepOutcome::Continue => {}
                StepOutcome::Suspend { reason } => {
                    let _ = sink.send(DialogEvent::RunSuspended {
                        run_id: run_id.clone(),
                        node: current.clone(),
                        reason: reason.clone(),
                        prompt: state.last_assistant_message().map(str::to_string),
                    });
                    return Ok(RunReport {
                        run_id,
                        status: RunStatus::Suspended { reason },
                        steps,
                        state,
                    });
                }
                StepOutcome::Done => {
                    let answer = state.last_assistant_message().map(str::to_string);
                    let _ = sink.send(DialogEvent::RunCompleted {
                        run_id: run_id.clone(),
                        answer,
                    });
                    return Ok(RunReport {
                        run_id,
                        status: RunStatus::Completed,
                        steps,
                        state,
                    });
                }
                StepOutcome::Failed { kind, detail } => {
                    let _ = sink.send(DialogEvent::RunFailed {
                        run_id: run_id.clone(),
                        kind,
                        detail: detail.clone(),
                    });
                    return Ok(RunReport {
                        run_id,
                        status: RunStatus::Failed { kind, detail },
                        steps,
                        state,
                    });
                }
            }

            match self.next_node(graph, &current, &state, &visits)? {
                Some(next) => current = next,
                None => {
                    // Reached an end of the graph without an explicit
                    // terminal delta; the run still completed.
                    let answer = state.last_assistant_message().map(str::to_string);
                    let _ = sink.send(DialogEvent::RunCompleted {
                        run_id: run_id.clone(),
                        answer,
                    });
                    return Ok(RunReport {
                        run_id,
                        status: RunStatus::Completed,
                        steps,
                        state,
                    });
                }
            }
        }
    }

    /// Resolve the next node from the routing table.
    ///
    /// Returns `None` when the current node ends the graph. Conditional
    /// routes are evaluated with the node's pure selector; if the selected
    /// target has exhausted its visit budget, the cycle is treated as
    /// satisfied and the first alternative target in declaration order is
    /// taken instead.
    fn next_node(
        &self,
        graph: &DialogGraph,
        current: &str,
        state: &ConversationState,
        visits: &HashMap<String, u32>,
    ) -> Result<Option<String>> {
        match graph.routing(current) {
            Some(Routing::Next(to)) => Ok(Some(to.clone())),
            Some(Routing::End) => Ok(None),
            Some(Routing::Choose { select, targets }) => {
                let label = (**select)(state);
                let chosen = targets
                    .iter()
                    .find(|(l, _)| *l == label)
                    .map(|(_, to)| to.clone())
                    .ok_or_else(|| EngineError::NoRoute {
                        node: current.to_string(),
                        label: label.to_string(),
                    })?;

                if visits.get(&chosen).copied().unwrap_or(0) >= self.config.max_cycle_visits {
                    let fallback = targets
                        .iter()
                        .find(|(_, to)| *to != chosen)
                        .map(|(_, to)| to.clone())
                        .ok_or_else(|| EngineError::NoRoute {
                            node: current.to_string(),
                            label: label.to_string(),
                        })?;
                    log::warn!(
                        "cycle target '{chosen}' exhausted its visit budget; proceeding to '{fallback}'"
                    );
                    return Ok(Some(fallback));
                }
                Ok(Some(chosen))
            }
            // build() guarantees a route per node; reaching here means the
            // graph was constructed outside the builder.
            None => Err(EngineError::UnknownNode(current.to_string())),
        }
    }
}

impl Default for GraphExecutor {
    fn default() -> Self {
        Self::new()
    }
}
