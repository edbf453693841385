//! Trace events and handlers.
//!
//! Lookups and chat sessions report progress through [`TraceEvent`]
//! variants. Front-ends implement [`EventHandler`] to react to them.
//!
//! # Choosing an event handler
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or headless runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | [`CompositeEventHandler`] | Compose multiple handlers in order |
//! | [`ViewEventHandler`](crate::ui::ViewEventHandler) | Mirror events into shared view state |

use tracing::{debug, info, trace, warn};

use crate::chat::ChatMessage;
use crate::persona::Persona;
use crate::ui::ScanStatus;

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted while a lookup runs or a chat turn is answered.
#[derive(Debug)]
pub enum TraceEvent<'a> {
    /// A lookup was accepted and the scan is starting.
    LookupStarted { trace_id: &'a str, handle: &'a str },
    /// The scan moved to a new status.
    Status(ScanStatus),
    /// A scan log line.
    Log(&'a str),
    /// Token usage reported by the API for one call.
    TokenUsage {
        model: &'a str,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// The normalized persona is ready to render.
    Revealed(&'a Persona),
    /// The generation call failed. `message` is user-facing, `detail` is not.
    Failed { message: &'a str, detail: &'a str },
    /// A message was appended to the chat transcript.
    ChatMessage(&'a ChatMessage),
    /// The assistant started or stopped composing a reply.
    Typing(bool),
}

/// Handler for trace events.
///
/// The default implementation ignores everything.
///
/// # Example
///
/// ```ignore
/// struct Printer;
///
/// impl EventHandler for Printer {
///     fn on_event(&self, event: &TraceEvent<'_>) {
///         if let TraceEvent::Log(line) = event {
///             println!("> {line}");
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &TraceEvent<'_>) {
        let _ = event;
    }
}

/// A handler that ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let TraceEvent::Log(line) = event {
///         println!("{line}");
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&TraceEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&TraceEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&TraceEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &TraceEvent<'_>) {
        (self.0)(event)
    }
}

/// An event handler that delegates to multiple inner handlers, in
/// registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with(ViewEventHandler::new(state.clone(), lookup_id));
/// ```
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &TraceEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// An event handler that logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &TraceEvent<'_>) {
        match event {
            TraceEvent::LookupStarted { trace_id, handle } => {
                info!("[{trace_id}] lookup started: {handle}");
            }
            TraceEvent::Status(status) => {
                debug!("Scan status: {status}");
            }
            TraceEvent::Log(line) => {
                debug!("> {line}");
            }
            TraceEvent::TokenUsage {
                model,
                prompt_tokens,
                completion_tokens,
            } => {
                debug!("Tokens ({model}): prompt={prompt_tokens}, completion={completion_tokens}");
            }
            TraceEvent::Revealed(persona) => {
                info!(
                    "Revealed {}: found={}, risk={}, platforms={}, sources={}",
                    persona.handle,
                    persona.found,
                    persona.risk_score,
                    persona.platforms.len(),
                    persona.sources.len()
                );
            }
            TraceEvent::Failed { message, detail } => {
                warn!("Lookup failed: {message} ({detail})");
            }
            TraceEvent::ChatMessage(message) => {
                let preview: String = message.text.chars().take(200).collect();
                debug!(
                    "Chat [{}] {preview}{}",
                    message.sender,
                    if message.text.chars().count() > 200 { "..." } else { "" }
                );
            }
            TraceEvent::Typing(typing) => {
                trace!("Typing: {typing}");
            }
        }
    }
}
