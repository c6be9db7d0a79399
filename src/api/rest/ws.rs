use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::future;
use futures::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::state::AppState;
use crate::store::{Collection, DataStore};

#[derive(Deserialize)]
pub struct WatchQuery {
    pub collection: Option<Collection>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WatchQuery>,
) -> impl IntoResponse {
    let collection = query.collection.unwrap_or(Collection::Deliveries);
    ws.on_upgrade(move |socket| handle_socket(socket, state, collection))
}

/// Snapshots of `collection` as the JSON text frames sent to websocket clients.
pub fn snapshot_feed(
    store: &Arc<DataStore>,
    collection: Collection,
) -> impl Stream<Item = String> + Send + use<> {
    store
        .subscribe(collection)
        .filter_map(|snapshot| {
            future::ready(match serde_json::to_string(&snapshot) {
                Ok(json) => Some(json),
                Err(err) => {
                    warn!(error = %err, "failed to serialize snapshot for ws");
                    None
                }
            })
        })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, collection: Collection) {
    let (mut sender, mut receiver) = socket.split();
    let mut frames = Box::pin(snapshot_feed(&state.store, collection));

    state.metrics.store_subscribers.inc();
    info!(%collection, "websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(json) = frames.next().await {
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    run_until_either(send_task, recv_task).await;

    state.metrics.store_subscribers.dec();
    info!(%collection, "websocket client disconnected");
}

/// Waits for the first task to finish and aborts the other.
async fn run_until_either(mut a: JoinHandle<()>, mut b: JoinHandle<()>) {
    tokio::select! {
        _ = &mut a => b.abort(),
        _ = &mut b => a.abort(),
    }
}
