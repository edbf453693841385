//! Serializable projection of [`ViewState`] for WebSocket and REST transport.
//!
//! [`StateSnapshot`] adds what a browser needs to render without extra round
//! trips: the label table of the current language, whether chat is open, and
//! the usage summary. Logs are capped to the most recent entries.

use neon_trace::api::tracing::CostTracker;
use neon_trace::chat::ChatMessage;
use neon_trace::i18n::{Labels, Language};
use neon_trace::persona::Persona;
use neon_trace::ui::{LogLine, ScanStatus, ViewState};
use serde::Serialize;

/// Maximum number of log lines included in a snapshot.
const SNAPSHOT_MAX_LOGS: usize = 100;

#[derive(Debug, Serialize)]
pub struct StateSnapshot {
    // ── View ──
    pub status: ScanStatus,
    pub language: Language,
    pub labels: &'static Labels,
    pub disclaimer_accepted: bool,

    // ── Current lookup ──
    pub lookup_id: u64,
    pub logs: Vec<LogLine>,
    pub persona: Option<Persona>,
    pub error: Option<String>,

    // ── Chat ──
    pub chat_open: bool,
    pub transcript: Vec<ChatMessage>,
    pub typing: bool,

    // ── Accounting ──
    pub usage: CostTracker,
    pub usage_summary: String,
}

impl StateSnapshot {
    /// Build a snapshot from the current `ViewState`. Call while holding the
    /// lock.
    pub fn from_view_state(state: &ViewState) -> Self {
        let log_start = state.logs.len().saturating_sub(SNAPSHOT_MAX_LOGS);

        Self {
            status: state.status,
            language: state.language,
            labels: state.language.labels(),
            disclaimer_accepted: state.disclaimer_accepted,
            lookup_id: state.lookup_id,
            logs: state.logs.get(log_start..).unwrap_or_default().to_vec(),
            persona: state.persona.clone(),
            error: state.error.clone(),
            chat_open: state.chat_open(),
            transcript: state.transcript.clone(),
            typing: state.typing,
            usage: state.usage.clone(),
            usage_summary: state.usage.summary(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_from_default_state() {
        let state = ViewState::default();
        let snap = StateSnapshot::from_view_state(&state);

        assert_eq!(snap.status, ScanStatus::Idle);
        assert_eq!(snap.language, Language::Ru);
        assert!(!snap.disclaimer_accepted);
        assert!(!snap.chat_open);
        assert!(snap.logs.is_empty());
        assert!(snap.persona.is_none());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut state = ViewState::default();
        state.language = Language::En;
        let json = StateSnapshot::from_view_state(&state).to_json();

        assert_eq!(json["status"], "IDLE");
        assert_eq!(json["language"], "EN");
        assert_eq!(json["labels"]["execute"], ":: EXECUTE PROTOCOL ::");
        assert!(json["persona"].is_null());
        assert_eq!(json["usage"]["calls"], 0);
    }

    #[test]
    fn snapshot_caps_logs() {
        let mut state = ViewState::default();
        for i in 0..150 {
            state.push_log(&format!("msg {i}"));
        }

        let snap = StateSnapshot::from_view_state(&state);
        assert_eq!(snap.logs.len(), SNAPSHOT_MAX_LOGS);
        assert_eq!(snap.logs[0].message, "msg 50");
        assert_eq!(snap.logs[99].message, "msg 149");
    }
}
