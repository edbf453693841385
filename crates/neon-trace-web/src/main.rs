//! NEON TRACE web server.
//!
//! Serves the REST + WebSocket presentation interface and drives lookups
//! against OpenRouter.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... cargo run -p neon-trace-web
//! OPENROUTER_KEY=sk-... cargo run -p neon-trace-web -- --port 8080 --static-dir ./web/out
//! ```
//!
//! ## Driving it by hand
//!
//! ```bash
//! curl -X POST localhost:3001/api/control -H 'content-type: application/json' \
//!   -d '{"action":"accept_disclaimer"}'
//! curl -X POST localhost:3001/api/lookup -H 'content-type: application/json' \
//!   -d '{"handle":"@alice"}'
//! curl localhost:3001/api/state
//! ```
//!
//! Or over WebSocket (`/ws`):
//! ```json
//! {"type": "lookup", "handle": "@alice"}
//! {"type": "chat", "message": "where is this person based?"}
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use neon_trace::prelude::*;
use neon_trace::{CHAT_MODEL, DEFAULT_MODEL};
use neon_trace_web::{Driver, WebConfig, WsMessage, spawn_web};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// NEON TRACE web server.
#[derive(Parser)]
#[command(about = "REST + WebSocket server for NEON TRACE lookups")]
struct Args {
    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Directory of a built front-end to serve at `/`.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Model used for lookups.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Model used for follow-up chat.
    #[arg(long, default_value = CHAT_MODEL)]
    chat_model: String,

    /// Reveal results as soon as they arrive (no minimum scan time).
    #[arg(long)]
    instant: bool,

    /// WebSocket broadcast capacity before lagging clients are resynced.
    #[arg(long, default_value_t = 256)]
    broadcast_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "Set OPENROUTER_KEY env var to your OpenRouter API key")?;
    let client = OpenRouterClient::with_headers(
        api_key,
        "https://github.com/tacryt-socryp/neon-trace",
        "neon-trace-web",
    )?;

    let base = if args.instant {
        TraceConfig::instant()
    } else {
        TraceConfig::default()
    };
    let config = base
        .with_model(&args.model)
        .with_chat_model(&args.chat_model);

    let view_state = Arc::new(Mutex::new(ViewState::default()));
    let (ws_tx, _) = tokio::sync::broadcast::channel::<WsMessage>(args.broadcast_capacity);

    let web_config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
        ..Default::default()
    };
    let (addr, intents) = spawn_web(view_state.clone(), ws_tx.clone(), web_config).await?;
    info!("NEON TRACE listening on http://{addr}");

    Driver::new(Arc::new(client), config, view_state, ws_tx)
        .run(intents)
        .await;

    Ok(())
}
