//! Wayfarer HTTP service
//!
//! Thin transport glue around the dialog engine: request parsing, the
//! newline-delimited JSON chat stream, environment-based configuration, and
//! the health probe. Session and profile persistence stay with the caller;
//! every request carries its own profile.

pub mod config;
pub mod constants;
pub mod routes;
pub mod stream;

pub use config::{ConfigError, ServiceConfig};
pub use routes::{router, AppState, ChatRequest};
pub use stream::ClientEvent;
