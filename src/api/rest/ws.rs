use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::order::OrderEvent;
use crate::state::AppState;

/// Optional per-subscriber filter, mirroring the per-user and per-driver
/// channels the mobile clients subscribe to.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub user_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

impl EventFilter {
    fn matches(&self, event: &OrderEvent) -> bool {
        if let Some(user_id) = self.user_id {
            if event.user_id != user_id {
                return false;
            }
        }
        if let Some(driver_id) = self.driver_id {
            if event.driver_id != Some(driver_id) {
                return false;
            }
        }
        true
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(filter): Query<EventFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, filter))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, filter: EventFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.order_events_tx.subscribe();

    info!(?filter, "websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if !filter.matches(&event) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize order event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket client disconnected");
}
