//! View state shared between the lookup runtime and a front-end.
//!
//! ```text
//! Lookup / ChatSession ──TraceEvent──▶ ViewEventHandler ──▶ Arc<Mutex<ViewState>> ◀── front-end
//! ```
//!
//! [`ViewState`] is the single value the presentation layer renders. Every
//! transition replaces the affected fields under one lock. Front-end intents
//! (reset, language switch, disclaimer) go through the updater functions in
//! this module.

pub mod event_handler;

pub use event_handler::ViewEventHandler;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::api::tracing::{CostTracker, pricing_for_model};
use crate::chat::ChatMessage;
use crate::i18n::Language;
use crate::persona::Persona;

/// Maximum scan log lines kept in memory.
pub const MAX_LOG_LINES: usize = 200;

/// Which view the presentation layer shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
    Analyzing,
    Decrypting,
    Complete,
    Error,
}

impl ScanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Scanning => "SCANNING",
            Self::Analyzing => "ANALYZING",
            Self::Decrypting => "DECRYPTING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// Whether the scan animation is on screen.
    pub fn is_scanning(self) -> bool {
        matches!(self, Self::Scanning | Self::Analyzing | Self::Decrypting)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan log line with its wall-clock time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub message: String,
}

impl LogLine {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        }
    }
}

// ── ViewState ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ViewState {
    pub status: ScanStatus,
    pub language: Language,
    /// The disclaimer gate blocks lookups until this is set.
    pub disclaimer_accepted: bool,

    // ── Current lookup ──
    /// Bumped by every new lookup and every reset. Events tagged with an
    /// older id are stale.
    pub lookup_id: u64,
    pub logs: Vec<LogLine>,
    pub persona: Option<Persona>,
    pub error: Option<String>,

    // ── Chat ──
    /// Set once a chat session for the current lookup is ready to take
    /// messages. A reveal alone does not open chat.
    pub session_open: bool,
    pub transcript: Vec<ChatMessage>,
    pub typing: bool,

    // ── Accounting ──
    pub usage: CostTracker,
}

impl ViewState {
    /// Drop everything tied to the current lookup and invalidate it.
    fn clear_lookup(&mut self) {
        self.lookup_id += 1;
        self.logs.clear();
        self.persona = None;
        self.error = None;
        self.session_open = false;
        self.transcript.clear();
        self.typing = false;
    }

    pub fn push_log(&mut self, message: &str) {
        self.logs.push(LogLine::now(message));
        if self.logs.len() > MAX_LOG_LINES {
            let drain = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..drain);
        }
    }

    pub fn reveal(&mut self, persona: &Persona) {
        self.persona = Some(persona.clone());
        self.error = None;
        self.transcript.clear();
    }

    pub fn fail(&mut self, message: &str) {
        self.persona = None;
        self.error = Some(message.to_string());
        self.status = ScanStatus::Error;
    }

    pub fn record_usage(&mut self, model: &str, prompt_tokens: u32, completion_tokens: u32) {
        self.usage
            .record(prompt_tokens, completion_tokens, &pricing_for_model(model));
    }

    /// Whether chat messages can be sent right now.
    pub fn chat_open(&self) -> bool {
        self.session_open && self.status == ScanStatus::Complete && self.persona.is_some()
    }
}

// ── Updaters ──────────────────────────────────────────────────────────

/// Lock the shared state and run a block on the guard. Poisoned locks are
/// skipped.
macro_rules! with_state {
    ($state:expr, |$s:ident| $body:block) => {
        if let Ok(mut $s) = $state.lock() {
            $body
        }
    };
}
pub(crate) use with_state;

/// Start a new lookup: clear the previous one and enter SCANNING.
///
/// Returns the id that events of the new lookup must carry.
pub fn begin_lookup(state: &Arc<Mutex<ViewState>>) -> u64 {
    let mut id = 0;
    with_state!(state, |s| {
        s.clear_lookup();
        s.status = ScanStatus::Scanning;
        id = s.lookup_id;
    });
    id
}

/// Show a validation error without starting a lookup.
pub fn reject_input(state: &Arc<Mutex<ViewState>>, message: &str) {
    with_state!(state, |s| {
        s.clear_lookup();
        s.fail(message);
    });
}

/// Mark the chat session of `lookup_id` as ready.
///
/// Returns `false`, leaving chat closed, if that lookup was superseded or
/// reset in the meantime.
pub fn open_chat(state: &Arc<Mutex<ViewState>>, lookup_id: u64) -> bool {
    let mut opened = false;
    with_state!(state, |s| {
        if s.lookup_id == lookup_id {
            s.session_open = true;
            opened = s.chat_open();
        }
    });
    opened
}

/// Back to IDLE. In-flight lookups and chat turns become stale.
pub fn reset(state: &Arc<Mutex<ViewState>>) {
    with_state!(state, |s| {
        s.clear_lookup();
        s.status = ScanStatus::Idle;
    });
}

pub fn accept_disclaimer(state: &Arc<Mutex<ViewState>>) {
    with_state!(state, |s| { s.disclaimer_accepted = true });
}

/// Switch the output language. Only honored while IDLE; returns whether the
/// switch happened.
pub fn set_language(state: &Arc<Mutex<ViewState>>, language: Language) -> bool {
    let mut switched = false;
    with_state!(state, |s| {
        if s.status == ScanStatus::Idle {
            s.language = language;
            switched = true;
        }
    });
    switched
}

/// The current language, or the default if the lock is poisoned.
pub fn language(state: &Arc<Mutex<ViewState>>) -> Language {
    state.lock().map(|s| s.language).unwrap_or_default()
}
