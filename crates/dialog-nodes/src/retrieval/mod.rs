//! Hybrid retrieval building blocks: sparse query encoding and rank fusion.

pub mod fusion;
pub mod sparse;

pub use fusion::reciprocal_rank_fusion;
pub use sparse::encode as encode_sparse;
