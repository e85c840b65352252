//! Webhook listener feeding the dispatcher

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tokio::sync::mpsc;

use super::Update;
use crate::application::errors::BotError;
use crate::domain::entities;

/// Router accepting Telegram updates posted to `endpoint`
pub fn router(endpoint: &str, updates: mpsc::Sender<entities::Update>) -> Router {
    Router::new()
        .route(endpoint, post(receive))
        .with_state(updates)
}

/// Listen on `0.0.0.0:port` until the server fails
pub async fn serve(endpoint: &str, port: u16, updates: mpsc::Sender<entities::Update>) -> Result<(), BotError> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| BotError::Network(format!("Failed to bind port {}: {}", port, e)))?;

    tracing::info!(port, endpoint, "Webhook listener started");

    axum::serve(listener, router(endpoint, updates))
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}

async fn receive(
    State(updates): State<mpsc::Sender<entities::Update>>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update = ?update, "Received update");

    match updates.send(update.into()).await {
        Ok(()) => StatusCode::OK,
        Err(_) => {
            tracing::warn!("Dispatcher gone, rejecting webhook update");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i64) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": id,
            "message": {
                "message_id": 1,
                "chat": { "id": 2 },
                "from": { "id": 3, "first_name": "Bob" },
                "text": "hello"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_receive_forwards_update() {
        let (tx, mut rx) = mpsc::channel(1);

        let status = receive(State(tx), Json(update(42))).await;
        assert_eq!(status, StatusCode::OK);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, 42);
        assert_eq!(received.message.unwrap().text, "hello");
    }

    #[tokio::test]
    async fn test_receive_without_dispatcher() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let status = receive(State(tx), Json(update(1))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
