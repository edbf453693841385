//! WebSocket upgrade handler and message dispatch.
//!
//! Each connected client receives:
//! 1. A full [`StateSnapshot`](crate::snapshot::StateSnapshot) on connect.
//! 2. Incremental [`WsMessage`] updates as trace events fire.
//!
//! Clients send the same intents as the REST API, tagged by `type`.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt, stream::SplitSink};
use neon_trace::i18n::Language;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::broadcast::WsMessage;
use crate::intent::{self, AppState, ControlAction};

/// A message received from a WebSocket client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Lookup { handle: String },
    Chat { message: String },
    Reset,
    AcceptDisclaimer,
    SetLanguage { language: Language },
}

/// GET /ws — WebSocket upgrade handler.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before the snapshot so no update falls between the two.
    let mut broadcast_rx = app.broadcast_tx.subscribe();

    let snapshot_msg = WsMessage::Snapshot {
        data: app.snapshot().to_json(),
    };
    if ws_send(&mut sink, &snapshot_msg).await.is_err() {
        return;
    }

    debug!("WebSocket client connected");

    let resync = app.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged by {n} messages, resending snapshot");
                    let msg = WsMessage::Snapshot {
                        data: resync.snapshot().to_json(),
                    };
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => handle_client_message(&text, &app),
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("WebSocket client disconnected");
    forward_task.abort();
}

/// Process a JSON message received from a client.
///
/// Rejections have no reply channel here; the view state (and the snapshot
/// broadcast that follows it) is the response.
fn handle_client_message(text: &str, app: &AppState) {
    let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
        debug!("Ignoring malformed WebSocket message");
        return;
    };

    let outcome = match msg {
        ClientMessage::Lookup { handle } => intent::submit_lookup(app, &handle),
        ClientMessage::Chat { message } => intent::submit_chat(app, message),
        ClientMessage::Reset => {
            intent::apply_control(app, ControlAction::Reset);
            Ok(())
        }
        ClientMessage::AcceptDisclaimer => {
            intent::apply_control(app, ControlAction::AcceptDisclaimer);
            Ok(())
        }
        ClientMessage::SetLanguage { language } => {
            intent::apply_control(app, ControlAction::SetLanguage(language));
            Ok(())
        }
    };
    if let Err(rejection) = outcome {
        debug!("WebSocket intent rejected: {rejection:?}");
    }
}

/// Serialize a `WsMessage` and send it over the WebSocket sink.
async fn ws_send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"lookup","handle":"@alice"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Lookup { handle } if handle == "@alice"));
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"set_language","language":"EN"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SetLanguage {
                language: Language::En
            }
        ));
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"accept_disclaimer"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::AcceptDisclaimer));
    }
}
