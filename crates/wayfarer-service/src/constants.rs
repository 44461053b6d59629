//! Service-wide constants

/// Default values, overridable from the environment
pub mod defaults {
    /// Address the HTTP listener binds to
    pub const BIND_ADDR: &str = "127.0.0.1:8787";
    /// Answer language when the request does not name one
    pub const RESPONSE_LANGUAGE: &str = "English";
}

/// Environment variable names recognized by the service
pub mod env_vars {
    pub const BIND_ADDR: &str = "WAYFARER_BIND_ADDR";
    pub const GENERATION_URL: &str = "WAYFARER_GENERATION_URL";
    pub const GENERATION_MODEL: &str = "WAYFARER_GENERATION_MODEL";
    pub const EMBEDDING_URL: &str = "WAYFARER_EMBEDDING_URL";
    pub const EMBEDDING_MODEL: &str = "WAYFARER_EMBEDDING_MODEL";
    pub const INDEX_URL: &str = "WAYFARER_INDEX_URL";
    pub const INDEX_COLLECTION: &str = "WAYFARER_INDEX_COLLECTION";
    pub const MAX_RETRIEVAL_ATTEMPTS: &str = "WAYFARER_MAX_RETRIEVAL_ATTEMPTS";
    pub const RESULT_SIZE: &str = "WAYFARER_RESULT_SIZE";
}
