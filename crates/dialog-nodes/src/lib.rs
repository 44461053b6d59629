//! Dialog Nodes
//!
//! Step implementations for the Wayfarer conversation graph, plus the
//! retrieval building blocks they compose:
//!
//! - **Gate**: profile completeness check and the ask-profile suspend step
//! - **Language**: query translation and answer synthesis
//! - **Retrieval**: sparse encoding, hybrid lookup, reciprocal-rank fusion
//! - **Judgment**: evidence grading with a bounded retry signal
//!
//! [`conversation_graph`] wires the steps into the fixed run topology with
//! explicitly injected collaborator handles.

pub mod graph;
pub mod nodes;
pub mod prompts;
pub mod retrieval;

pub use graph::{conversation_graph, ConversationConfig};
pub use nodes::{
    ids, AskProfileNode, GradeNode, ProfileCheckNode, RetrievalParams, RetrieveNode,
    SynthesizeNode, TranslateNode, PROFILE_INCOMPLETE, REQUIRED_PROFILE_FIELDS,
};
pub use retrieval::{encode_sparse, reciprocal_rank_fusion};
