//! Browser-facing server for neon-trace lookups.
//!
//! `neon-trace-web` exposes the presentation interface over an axum server:
//! a REST API for intents and the initial state load, and a WebSocket
//! endpoint that streams view updates as a lookup plays out. Any front-end
//! that renders a [`StateSnapshot`] and applies [`WsMessage`] updates can sit
//! on top.
//!
//! # Quick start
//!
//! ```ignore
//! use neon_trace::prelude::*;
//! use neon_trace_web::{Driver, WebConfig, spawn_web};
//! use std::sync::{Arc, Mutex};
//!
//! let view_state = Arc::new(Mutex::new(ViewState::default()));
//! let (ws_tx, _) = tokio::sync::broadcast::channel(256);
//!
//! let (addr, intents) = spawn_web(view_state.clone(), ws_tx.clone(), WebConfig::default()).await?;
//! println!("Web UI: http://{addr}");
//!
//! let backend = Arc::new(OpenRouterClient::new(api_key)?);
//! Driver::new(backend, TraceConfig::default(), view_state, ws_tx)
//!     .run(intents)
//!     .await;
//! ```
//!
//! # Architecture
//!
//! ```text
//!   /api/*, /ws ──▶ intent ──Intent──▶ Driver ──▶ Lookup / ChatSession
//!        │                                              │ TraceEvent
//!        ▼                                              ▼
//! Arc<Mutex<ViewState>> ◀── ViewEventHandler ◀──┬── CompositeEventHandler
//!                                               └─▶ WebBroadcastHandler ──WsMessage──▶ clients
//! ```
//!
//! | Endpoint | Effect |
//! |----------|--------|
//! | `GET /api/state` | Current [`StateSnapshot`] |
//! | `POST /api/lookup {"handle"}` | 202 accepted, 422 invalid handle, 423 disclaimer pending |
//! | `POST /api/chat {"message"}` | 204 forwarded, 409 no session or reply pending, 422 blank, 503 driver gone |
//! | `POST /api/control {"action"}` | 204; `reset`, `accept_disclaimer`, `{"set_language": "EN"}` |
//! | `GET /ws` | Snapshot, then incremental updates |

mod api;
pub mod broadcast;
pub mod driver;
pub mod intent;
mod server;
pub mod snapshot;
mod ws;

pub use broadcast::{WebBroadcastHandler, WsMessage};
pub use driver::Driver;
pub use intent::{ControlAction, Intent, Rejection};
pub use snapshot::StateSnapshot;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use neon_trace::ui::ViewState;
use tokio::sync::mpsc;

use crate::intent::AppState;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory of a built front-end to serve at `/`. If `None`, only the
    /// API and WebSocket endpoints are served.
    pub static_dir: Option<PathBuf>,
    /// Intents buffered before `/api/*` starts answering 503. Default: 32.
    pub intent_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
            intent_capacity: 32,
        }
    }
}

/// Spawn the web server on a Tokio task.
///
/// Returns the bound address and the receiver of intents that need the
/// model. Hand the receiver to [`Driver::run`].
///
/// `broadcast_tx` is the sender half of the WebSocket broadcast channel; its
/// capacity is how far a client may fall behind before it is resynchronized
/// with a fresh snapshot.
pub async fn spawn_web(
    view_state: Arc<Mutex<ViewState>>,
    broadcast_tx: tokio::sync::broadcast::Sender<WsMessage>,
    config: WebConfig,
) -> Result<(SocketAddr, mpsc::Receiver<Intent>), String> {
    let (intent_tx, intent_rx) = mpsc::channel(config.intent_capacity);
    let app = AppState {
        view_state,
        intent_tx,
        broadcast_tx,
    };
    let router = server::build_router(app, config.static_dir);
    let addr = server::start_server(router, config.bind_addr).await?;
    Ok((addr, intent_rx))
}
