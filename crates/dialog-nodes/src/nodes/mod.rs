//! The six dialog steps of the conversation graph.

pub mod ask_profile;
pub mod grade;
pub mod profile_check;
pub mod retrieve;
pub mod synthesize;
pub mod translate;

pub use ask_profile::{AskProfileNode, PROFILE_INCOMPLETE};
pub use grade::GradeNode;
pub use profile_check::{ProfileCheckNode, REQUIRED_PROFILE_FIELDS};
pub use retrieve::{RetrievalParams, RetrieveNode};
pub use synthesize::SynthesizeNode;
pub use translate::TranslateNode;

/// Node identifiers, also the `node` field of progress events.
pub mod ids {
    pub const PROFILE_CHECK: &str = "profile_check";
    pub const ASK_PROFILE: &str = "ask_profile";
    pub const TRANSLATE: &str = "translate";
    pub const RETRIEVE: &str = "retrieve";
    pub const GRADE: &str = "grade";
    pub const SYNTHESIZE: &str = "synthesize";
}
