//! HTTP routes
//!
//! `POST /chat` accepts one conversational turn and answers with a
//! newline-delimited JSON stream of [`ClientEvent`](crate::stream::ClientEvent)
//! lines. The dialog run executes on its own task; events flow through an
//! unbounded channel into the response body, preserving node-completion
//! order.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};

use dialog_engine::{
    ChannelEventSink, ConversationState, DialogEvent, DialogGraph, EventSink, FailureKind,
    GraphExecutor,
};

use crate::constants::defaults;
use crate::stream::{client_event, to_line};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<DialogGraph>,
    pub executor: Arc<GraphExecutor>,
}

/// One conversational turn from the client.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user_profile: BTreeMap<String, String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn chat_handler(State(app): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let sink = ChannelEventSink::new(tx);

    let state = ConversationState::for_turn(
        request.message,
        request.user_profile,
        request
            .language
            .unwrap_or_else(|| defaults::RESPONSE_LANGUAGE.to_string()),
    );

    let graph = app.graph.clone();
    let executor = app.executor.clone();
    tokio::spawn(async move {
        if let Err(e) = executor.run(&graph, state, &sink).await {
            // Engine-level aborts still owe the client a terminal line.
            log::error!("dialog run aborted: {e}");
            let _ = sink.send(DialogEvent::RunFailed {
                run_id: String::new(),
                kind: FailureKind::Internal,
                detail: e.to_string(),
            });
        }
    });

    let lines = UnboundedReceiverStream::new(rx)
        .filter_map(|event| client_event(&event).as_ref().and_then(to_line))
        .map(Ok::<String, Infallible>);

    match Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(lines))
    {
        Ok(response) => response,
        Err(e) => {
            log::error!("failed to build chat response: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
