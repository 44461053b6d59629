//! Wayfarer service binary
//!
//! Wires configuration, collaborator clients, the conversation graph, and
//! the HTTP listener together.

use std::sync::Arc;

use dialog_engine::{ExecutorConfig, GraphExecutor};
use dialog_nodes::conversation_graph;
use providers::{HttpDocumentIndex, HttpEmbeddingClient, HttpGenerationClient};
use wayfarer_service::config::ServiceConfig;
use wayfarer_service::routes::{router, AppState};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let generation = Arc::new(HttpGenerationClient::new(config.generation.clone()));
    let embedding = Arc::new(HttpEmbeddingClient::new(config.embedding.clone()));
    let index = Arc::new(HttpDocumentIndex::new(config.index.clone()));

    let graph = match conversation_graph(generation, embedding, index, config.conversation.clone())
    {
        Ok(graph) => Arc::new(graph),
        Err(e) => {
            log::error!("failed to assemble conversation graph: {e}");
            std::process::exit(1);
        }
    };

    let executor = Arc::new(GraphExecutor::with_config(ExecutorConfig {
        max_cycle_visits: config.conversation.max_retrieval_attempts,
        ..ExecutorConfig::default()
    }));

    let app = router(AppState { graph, executor });

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind {}: {e}", config.bind_addr);
            std::process::exit(1);
        }
    };
    log::info!("Wayfarer listening on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server error: {e}");
    }
}
