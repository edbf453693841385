//! [`EventHandler`] that converts trace events into WebSocket messages.
//!
//! [`WebBroadcastHandler`] turns [`TraceEvent`] variants into [`WsMessage`]
//! values and broadcasts them to all connected WebSocket clients via a
//! `tokio::sync::broadcast` channel.

use std::sync::{Arc, Mutex};

use neon_trace::chat::ChatMessage;
use neon_trace::events::{EventHandler, TraceEvent};
use neon_trace::persona::Persona;
use neon_trace::ui::{LogLine, ScanStatus, ViewState};
use serde::Serialize;
use tokio::sync::broadcast;

/// A message sent from the server to WebSocket clients.
///
/// Discriminated on the `type` field when serialized to JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Full state snapshot (sent on connect, after control actions, and to
    /// lagging clients).
    Snapshot { data: serde_json::Value },
    /// The view changed.
    Status { status: ScanStatus },
    /// A scan log line.
    Log { line: LogLine },
    /// The lookup revealed a persona.
    Persona { persona: Persona },
    /// The lookup failed.
    Error { message: String },
    /// A transcript entry, user or assistant.
    ChatMessage { message: ChatMessage },
    /// The assistant started or stopped typing.
    Typing { typing: bool },
    /// Token usage of one model call.
    TokenUsage {
        model: String,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
}

/// Event handler that broadcasts the events of one lookup to WebSocket
/// clients.
///
/// Like [`ViewEventHandler`](neon_trace::ui::ViewEventHandler), it goes
/// quiet once the lookup it was created for is superseded or reset:
///
/// ```ignore
/// let lookup_id = ui::begin_lookup(&view_state);
/// let handler = CompositeEventHandler::new()
///     .with(ViewEventHandler::new(view_state.clone(), lookup_id))
///     .with(WebBroadcastHandler::new(ws_sender, view_state.clone(), lookup_id));
/// ```
pub struct WebBroadcastHandler {
    sender: broadcast::Sender<WsMessage>,
    view_state: Arc<Mutex<ViewState>>,
    lookup_id: u64,
}

impl WebBroadcastHandler {
    pub fn new(
        sender: broadcast::Sender<WsMessage>,
        view_state: Arc<Mutex<ViewState>>,
        lookup_id: u64,
    ) -> Self {
        Self {
            sender,
            view_state,
            lookup_id,
        }
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Silently ignores send errors (no subscribers is fine).
    fn broadcast(&self, msg: WsMessage) {
        let _ = self.sender.send(msg);
    }

    fn is_current(&self) -> bool {
        self.view_state
            .lock()
            .map(|s| s.lookup_id == self.lookup_id)
            .unwrap_or(false)
    }
}

impl EventHandler for WebBroadcastHandler {
    fn on_event(&self, event: &TraceEvent<'_>) {
        if let TraceEvent::TokenUsage {
            model,
            prompt_tokens,
            completion_tokens,
        } = event
        {
            self.broadcast(WsMessage::TokenUsage {
                model: model.to_string(),
                prompt_tokens: *prompt_tokens,
                completion_tokens: *completion_tokens,
            });
            return;
        }
        if !self.is_current() {
            return;
        }
        match event {
            TraceEvent::Status(status) => {
                self.broadcast(WsMessage::Status { status: *status });
            }
            TraceEvent::Log(line) => {
                self.broadcast(WsMessage::Log {
                    line: LogLine::now(*line),
                });
            }
            TraceEvent::Revealed(persona) => {
                self.broadcast(WsMessage::Persona {
                    persona: (*persona).clone(),
                });
            }
            TraceEvent::Failed { message, .. } => {
                self.broadcast(WsMessage::Error {
                    message: message.to_string(),
                });
            }
            TraceEvent::ChatMessage(message) => {
                self.broadcast(WsMessage::ChatMessage {
                    message: (*message).clone(),
                });
            }
            TraceEvent::Typing(typing) => {
                self.broadcast(WsMessage::Typing { typing: *typing });
            }
            TraceEvent::LookupStarted { .. } | TraceEvent::TokenUsage { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_trace::ui::{begin_lookup, reset};

    fn drain(rx: &mut broadcast::Receiver<WsMessage>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(serde_json::to_value(&msg).unwrap());
        }
        out
    }

    #[test]
    fn ws_message_serializes_with_type_tag() {
        let msg = WsMessage::Status {
            status: ScanStatus::Decrypting,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["status"], "DECRYPTING");
    }

    #[test]
    fn ws_message_chat_message_serializes() {
        let msg = WsMessage::ChatMessage {
            message: ChatMessage::assistant("Yo."),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "chat_message");
        assert_eq!(json["message"]["sender"], "assistant");
        assert_eq!(json["message"]["text"], "Yo.");
    }

    #[test]
    fn current_lookup_events_are_broadcast() {
        let (sender, mut rx) = broadcast::channel(16);
        let state = Arc::new(Mutex::new(ViewState::default()));
        let handler = WebBroadcastHandler::new(sender, state.clone(), begin_lookup(&state));

        handler.on_event(&TraceEvent::Log("ESTABLISHING SECURE HANDSHAKE..."));
        handler.on_event(&TraceEvent::Typing(true));
        handler.on_event(&TraceEvent::Failed {
            message: "CONNECTION TERMINATED. TARGET UNRESPONSIVE.",
            detail: "HTTP 500",
        });

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["type"], "log");
        assert_eq!(sent[0]["line"]["message"], "ESTABLISHING SECURE HANDSHAKE...");
        assert_eq!(sent[1]["typing"], true);
        assert_eq!(sent[2]["type"], "error");
        assert_eq!(sent[2]["message"], "CONNECTION TERMINATED. TARGET UNRESPONSIVE.");
    }

    #[test]
    fn stale_lookup_only_reports_usage() {
        let (sender, mut rx) = broadcast::channel(16);
        let state = Arc::new(Mutex::new(ViewState::default()));
        let handler = WebBroadcastHandler::new(sender, state.clone(), begin_lookup(&state));
        reset(&state);

        handler.on_event(&TraceEvent::Status(ScanStatus::Complete));
        handler.on_event(&TraceEvent::TokenUsage {
            model: neon_trace::DEFAULT_MODEL,
            prompt_tokens: 10,
            completion_tokens: 2,
        });

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "token_usage");
    }
}
