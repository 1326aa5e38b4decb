//! WebSocket endpoint.
//!
//! `GET /ws` upgrades to a socket carrying JSON text frames; `GET /healthz`
//! answers `ok`. Each socket gets a bounded outbound channel drained by a
//! writer task, so the session manager never awaits a slow client.

use crate::adapter;
use crate::protocol::{ClientMessage, RejectCode, ServerMessage};
use crate::session::{Connection, SessionManager};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Builds the HTTP router.
pub fn router(manager: SessionManager) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .layer(ServiceBuilder::new().map_request(|req: Request<axum::body::Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(manager)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(manager): State<SessionManager>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, manager))
}

#[instrument(skip_all)]
async fn handle_socket(socket: WebSocket, manager: SessionManager) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(*manager.config().outbox_capacity());
    info!("Socket opened");

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "Failed to encode outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection::new(tx);
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => handle_text(&manager, &mut conn, text.as_str()),
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(participant = ?conn.participant(), "Socket closed");
    manager.disconnect(&conn);
    write_task.abort();
}

/// Decodes one text frame and routes it, answering the sender with a
/// rejection if the frame is malformed or the intent is refused.
#[instrument(skip(manager, conn, text), fields(participant = ?conn.participant()))]
pub fn handle_text(manager: &SessionManager, conn: &mut Connection, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "Invalid inbound message");
            conn.send(ServerMessage::Rejected {
                code: RejectCode::BadRequest,
                message: err.to_string(),
            });
            return;
        }
    };

    if let Err(err) = manager.handle(conn, message) {
        conn.send(adapter::rejection(&err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::StatusCode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tower::ServiceExt;

    fn manager() -> SessionManager {
        SessionManager::new(ServerConfig::default(), StdRng::seed_from_u64(3))
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = router(manager())
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[test]
    fn test_garbage_frame_is_bad_request() {
        let manager = manager();
        let (tx, mut rx) = mpsc::channel(8);
        let mut conn = Connection::new(tx);

        handle_text(&manager, &mut conn, "{not json");

        match rx.try_recv().unwrap() {
            ServerMessage::Rejected { code, .. } => assert_eq!(code, RejectCode::BadRequest),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_refused_intent_goes_back_to_sender() {
        let manager = manager();
        let (tx, mut rx) = mpsc::channel(8);
        let mut conn = Connection::new(tx);

        handle_text(&manager, &mut conn, r#"{"type":"roll"}"#);

        match rx.try_recv().unwrap() {
            ServerMessage::Rejected { code, .. } => assert_eq!(code, RejectCode::NoSuchMatch),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_enqueue_frame_queues() {
        let manager = manager();
        let (tx, mut rx) = mpsc::channel(8);
        let mut conn = Connection::new(tx);

        handle_text(&manager, &mut conn, r#"{"type":"enqueue","name":"ann"}"#);

        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Queued { position: 1, .. }));
        assert_eq!(manager.queue_len(), 1);
    }
}
