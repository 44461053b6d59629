//! Dialog graph types: nodes, routing, and the graph builder.
//!
//! A graph is a fixed set of named nodes plus a routing table. Each node's
//! outgoing route is either unconditional, an end marker, or a conditional
//! branch whose label is chosen by a pure function over the current state.
//! Graphs are immutable after build and shared across concurrent runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::delta::StepDelta;
use crate::error::{EngineError, Result};
use crate::state::ConversationState;

/// A pure routing selector: reads the state, names the branch to take.
///
/// Selectors may close over configuration (loop bounds, thresholds) but must
/// stay side-effect free so that identical state always routes identically.
pub type RouteSelector = Arc<dyn Fn(&ConversationState) -> &'static str + Send + Sync>;

/// A single dialog step.
///
/// Transforms read the state and return a [`StepDelta`]; the executor owns
/// the merge. Implementations hold their collaborators (service handles)
/// behind `Arc` so the node itself stays cheaply shareable.
#[async_trait]
pub trait DialogNode: Send + Sync {
    /// Stable node identifier, unique within a graph.
    fn id(&self) -> &str;

    /// Execute the step against the current state.
    async fn run(&self, state: &ConversationState) -> Result<StepDelta>;
}

/// Outgoing route of a node.
pub enum Routing {
    /// Unconditionally proceed to the named node.
    Next(String),
    /// The run ends after this node.
    End,
    /// Branch on a label computed from the state.
    ///
    /// `targets` keeps declaration order; the executor uses that order to
    /// force forward progress when a cycle target is exhausted.
    Choose {
        select: RouteSelector,
        targets: Vec<(&'static str, String)>,
    },
}

/// An immutable dialog graph: named nodes plus a routing table.
pub struct DialogGraph {
    name: String,
    start: String,
    nodes: HashMap<String, Arc<dyn DialogNode>>,
    routing: HashMap<String, Routing>,
}

impl DialogGraph {
    /// Graph name, used in run-started events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the designated start node.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Look up a node by ID.
    pub fn node(&self, id: &str) -> Option<&Arc<dyn DialogNode>> {
        self.nodes.get(id)
    }

    /// Look up the outgoing route of a node.
    pub fn routing(&self, id: &str) -> Option<&Routing> {
        self.routing.get(id)
    }
}

/// Builder for [`DialogGraph`], validated at build time.
pub struct DialogGraphBuilder {
    name: String,
    start: Option<String>,
    nodes: HashMap<String, Arc<dyn DialogNode>>,
    routing: HashMap<String, Routing>,
}

impl DialogGraphBuilder {
    /// Start building a graph with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            nodes: HashMap::new(),
            routing: HashMap::new(),
        }
    }

    /// Register a node. The first registered node becomes the start node
    /// unless [`Self::start_at`] overrides it.
    pub fn add_node(mut self, node: Arc<dyn DialogNode>) -> Self {
        let id = node.id().to_string();
        if self.start.is_none() {
            self.start = Some(id.clone());
        }
        self.nodes.insert(id, node);
        self
    }

    /// Designate the start node explicitly.
    pub fn start_at(mut self, id: impl Into<String>) -> Self {
        self.start = Some(id.into());
        self
    }

    /// Add an unconditional edge.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.routing.insert(from.into(), Routing::Next(to.into()));
        self
    }

    /// Mark a node as an end of the graph.
    pub fn end(mut self, from: impl Into<String>) -> Self {
        self.routing.insert(from.into(), Routing::End);
        self
    }

    /// Add a conditional edge: `select` names one of the labeled targets.
    pub fn conditional(
        mut self,
        from: impl Into<String>,
        select: impl Fn(&ConversationState) -> &'static str + Send + Sync + 'static,
        targets: Vec<(&'static str, impl Into<String>)>,
    ) -> Self {
        let targets = targets
            .into_iter()
            .map(|(label, id)| (label, id.into()))
            .collect();
        self.routing.insert(
            from.into(),
            Routing::Choose {
                select: Arc::new(select),
                targets,
            },
        );
        self
    }

    /// Validate and build the graph.
    ///
    /// Checks that a start node is set and registered, that every routed
    /// node exists, and that every edge target resolves to a registered
    /// node.
    pub fn build(self) -> Result<DialogGraph> {
        let start = self
            .start
            .ok_or_else(|| EngineError::invalid_graph("no start node"))?;
        if !self.nodes.contains_key(&start) {
            return Err(EngineError::invalid_graph(format!(
                "start node '{start}' is not registered"
            )));
        }

        for (from, route) in &self.routing {
            if !self.nodes.contains_key(from) {
                return Err(EngineError::invalid_graph(format!(
                    "route declared for unregistered node '{from}'"
                )));
            }
            match route {
                Routing::Next(to) => {
                    if !self.nodes.contains_key(to) {
                        return Err(EngineError::invalid_graph(format!(
                            "edge {from} -> {to} targets an unregistered node"
                        )));
                    }
                }
                Routing::Choose { targets, .. } => {
                    if targets.is_empty() {
                        return Err(EngineError::invalid_graph(format!(
                            "conditional route on '{from}' has no targets"
                        )));
                    }
                    for (label, to) in targets {
                        if !self.nodes.contains_key(to) {
                            return Err(EngineError::invalid_graph(format!(
                                "edge {from} -[{label}]-> {to} targets an unregistered node"
                            )));
                        }
                    }
                }
                Routing::End => {}
            }
        }

        // Every node must have a route, or the executor would dead-end.
        for id in self.nodes.keys() {
            if !self.routing.contains_key(id) {
                return Err(EngineError::invalid_graph(format!(
                    "node '{id}' has no outgoing route"
                )));
            }
        }

        Ok(DialogGraph {
            name: self.name,
            start,
            nodes: self.nodes,
            routing: self.routing,
        })
    }
}
