//! Convenience re-exports for common `neon-trace` types.
//!
//! ```ignore
//! use neon_trace::prelude::*;
//! ```
//!
//! Covers running a lookup, chatting about the result, and observing both
//! through event handlers. Prompt text, schedules and pacing helpers stay in
//! their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatCompletion, ChatRequest, Message, ModelBackend, OpenRouterClient, Plugin};

// ── Lookup & chat ───────────────────────────────────────────────────
pub use crate::chat::{ChatMessage, ChatSession, Sender};
pub use crate::config::TraceConfig;
pub use crate::error::{HandleError, TraceError};
pub use crate::i18n::Language;
pub use crate::lookup::{Handle, Lookup, Reveal};
pub use crate::normalize::normalize_reply;
pub use crate::persona::{Persona, Platform, RiskScore, Source};
pub use crate::schedule::ScanSchedule;

// ── Events ──────────────────────────────────────────────────────────
pub use crate::events::{
    CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, TraceEvent,
};

// ── UI state ────────────────────────────────────────────────────────
pub use crate::ui::{ScanStatus, ViewEventHandler, ViewState};
