// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! HTTP surface: WebSocket upgrade, session bootstrap, health.
use crate::connection::Connection;
use crate::error::AppError;
use crate::metrics as keys;
use crate::websocket::EventHandler;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use craftchat_common::{ClientEvent, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use ::metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/login", post(login_handler))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for WebSocket connections
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    counter!(keys::WS_CONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).increment(1.0);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (conn, mut outbound) = Connection::channel();

    // Drain coordinator events into the socket as JSON text frames.
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize server event");
                    continue;
                },
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let handler = EventHandler::new(state.clone(), conn.clone());

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    counter!(keys::EVENT_DISPATCHED).increment(1);
                    handler.handle_event(event);
                },
                Err(err) => {
                    counter!(keys::EVENT_MALFORMED).increment(1);
                    tracing::warn!(error = %err, "unparsable client frame");
                    conn.send(ServerEvent::MalformedEvent {
                        message: err.to_string(),
                    });
                },
            },
            Message::Close(_) => break,
            _ => {}, // Ignore ping/pong/binary frames
        }
    }

    // Cascade cleanup for whichever identity this connection carried.
    state.coordinator.disconnect(&conn);

    counter!(keys::WS_DISCONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).decrement(1.0);
    send_task.abort();
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    nickname: String,
    avatar: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    user_id: String,
    nickname: String,
}

/// Session bootstrap: mint an identity for a nickname. The returned
/// `user_id` is the only credential the event channel knows about.
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user_id, nickname) = state
        .coordinator
        .create_identity(&request.nickname, request.avatar)?;
    Ok(Json(LoginResponse {
        success: true,
        user_id,
        nickname,
    }))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
