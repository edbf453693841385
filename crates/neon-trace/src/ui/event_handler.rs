//! `EventHandler` → `ViewState` bridge.
//!
//! [`ViewEventHandler`] maps trace events onto the shared view state. Compose
//! it with other handlers through
//! [`CompositeEventHandler`](crate::events::CompositeEventHandler):
//!
//! ```ignore
//! let lookup_id = ui::begin_lookup(&state);
//! let handler = CompositeEventHandler::new()
//!     .with(LoggingHandler)
//!     .with(ViewEventHandler::new(state.clone(), lookup_id));
//! ```

use std::sync::{Arc, Mutex};

use crate::events::{EventHandler, TraceEvent};

use super::{ViewState, with_state};

/// Writes the events of one lookup (and its chat) into [`ViewState`].
///
/// Once a newer lookup starts or the view is reset, the state's
/// `lookup_id` moves on and this handler stops writing, except for token
/// usage, which was spent either way.
pub struct ViewEventHandler {
    state: Arc<Mutex<ViewState>>,
    lookup_id: u64,
}

impl ViewEventHandler {
    pub fn new(state: Arc<Mutex<ViewState>>, lookup_id: u64) -> Self {
        Self { state, lookup_id }
    }
}

impl EventHandler for ViewEventHandler {
    fn on_event(&self, event: &TraceEvent<'_>) {
        with_state!(self.state, |s| {
            if let TraceEvent::TokenUsage {
                model,
                prompt_tokens,
                completion_tokens,
            } = event
            {
                s.record_usage(model, *prompt_tokens, *completion_tokens);
                return;
            }
            if s.lookup_id != self.lookup_id {
                return;
            }
            match event {
                TraceEvent::Status(status) => s.status = *status,
                TraceEvent::Log(line) => s.push_log(line),
                TraceEvent::Revealed(persona) => s.reveal(persona),
                TraceEvent::Failed { message, .. } => s.fail(message),
                TraceEvent::ChatMessage(message) => s.transcript.push((*message).clone()),
                TraceEvent::Typing(typing) => s.typing = *typing,
                TraceEvent::LookupStarted { .. } | TraceEvent::TokenUsage { .. } => {}
            }
        });
    }
}
