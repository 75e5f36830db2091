// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! WebSocket server
//!
//! Serves the embedded HTML client at `/` and a WebSocket endpoint at
//! `/ws`. One connection is one session: the client sends
//! `{"type":"query","text":"..."}` frames, the server answers with one
//! JSON frame per progress event. Queries on a connection are processed
//! strictly sequentially; a stalled client backpressures the engine
//! rather than losing events.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::engine::progress::ProgressSink;
use crate::engine::{ChatEngine, ChatbotState};
use crate::error::Result;

const INDEX_HTML: &str = include_str!("client.html");

/// Messages accepted from the client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Query { text: String },
}

#[derive(Clone)]
struct AppState {
    engine: Arc<ChatEngine>,
}

/// Build the router for the web client
pub fn router(engine: Arc<ChatEngine>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .with_state(AppState { engine })
}

/// Bind and serve until the process is stopped
pub async fn serve(engine: Arc<ChatEngine>, host: &str, port: u16) -> Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("web client listening on http://{}:{}", host, port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (ws_sink, mut ws_stream) = socket.split();
    let ws_sink = Arc::new(Mutex::new(ws_sink));

    // Per-connection session state; turns run sequentially by construction
    let mut chat_state = ChatbotState::new();
    debug!("websocket session opened");

    while let Some(Ok(message)) = ws_stream.next().await {
        match message {
            WsMessage::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Query { text: query }) => {
                    run_query(&state, &ws_sink, &mut chat_state, &query).await;
                }
                Err(e) => {
                    warn!("malformed client frame: {}", e);
                    let frame =
                        serde_json::json!({ "type": "error", "message": "malformed message" });
                    let _ = ws_sink
                        .lock()
                        .await
                        .send(WsMessage::Text(frame.to_string()))
                        .await;
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    debug!("websocket session closed");
}

type SharedSink = Arc<Mutex<futures::stream::SplitSink<WebSocket, WsMessage>>>;

async fn run_query(state: &AppState, ws_sink: &SharedSink, chat_state: &mut ChatbotState, query: &str) {
    let (sink, mut rx) = ProgressSink::channel(64);

    let forward_sink = Arc::clone(ws_sink);
    let forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(frame) = serde_json::to_string(&event) else {
                continue;
            };
            if forward_sink
                .lock()
                .await
                .send(WsMessage::Text(frame))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    state.engine.run_turn(chat_state, query, &sink).await;
    drop(sink);
    let _ = forward.await;
}
