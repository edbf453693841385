//! User intents and the synchronous half of handling them.
//!
//! Both transports (REST in `api`, WebSocket in `ws`) funnel into the
//! functions here. Validation and view-state transitions happen immediately
//! under the state lock; anything that needs the model is forwarded to the
//! [`Driver`](crate::driver::Driver) as an [`Intent`].

use std::sync::{Arc, Mutex};

use neon_trace::i18n::Language;
use neon_trace::lookup::Handle;
use neon_trace::ui::{self, ViewState};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::broadcast::WsMessage;
use crate::snapshot::StateSnapshot;

/// Work forwarded to the driver task.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Run a lookup whose view state was already entered under `lookup_id`.
    Lookup {
        handle: Handle,
        language: Language,
        lookup_id: u64,
    },
    /// One chat turn against the active session.
    Chat { message: String },
    /// Drop the chat session.
    Reset,
}

/// Control actions that only touch view state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Reset,
    AcceptDisclaimer,
    SetLanguage(Language),
}

/// Why an intent was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The handle failed validation; the error view is showing.
    InvalidInput,
    /// The disclaimer gate is still closed.
    DisclaimerPending,
    /// There is no open chat session to talk to.
    NoSession,
    /// The previous chat reply is still pending.
    Busy,
    /// The driver is not consuming intents.
    Unavailable,
}

/// Everything the transports share.
#[derive(Clone)]
pub struct AppState {
    pub view_state: Arc<Mutex<ViewState>>,
    pub intent_tx: mpsc::Sender<Intent>,
    pub broadcast_tx: broadcast::Sender<WsMessage>,
}

impl AppState {
    pub fn snapshot(&self) -> StateSnapshot {
        let state = self
            .view_state
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        StateSnapshot::from_view_state(&state)
    }

    /// Push a fresh snapshot to every client.
    pub fn broadcast_snapshot(&self) {
        let _ = self.broadcast_tx.send(WsMessage::Snapshot {
            data: self.snapshot().to_json(),
        });
    }
}

/// Validate `raw` and start a lookup for it.
pub fn submit_lookup(app: &AppState, raw: &str) -> Result<(), Rejection> {
    let (accepted, language) = {
        let s = app.view_state.lock().unwrap_or_else(|e| e.into_inner());
        (s.disclaimer_accepted, s.language)
    };
    if !accepted {
        return Err(Rejection::DisclaimerPending);
    }

    let handle = match Handle::parse(raw) {
        Ok(handle) => handle,
        Err(e) => {
            debug!("Rejected handle {raw:?}: {e}");
            ui::reject_input(&app.view_state, e.localized(language));
            app.broadcast_snapshot();
            return Err(Rejection::InvalidInput);
        }
    };

    let permit = app
        .intent_tx
        .try_reserve()
        .map_err(|_| Rejection::Unavailable)?;
    let lookup_id = ui::begin_lookup(&app.view_state);
    app.broadcast_snapshot();
    permit.send(Intent::Lookup {
        handle,
        language,
        lookup_id,
    });
    Ok(())
}

/// Forward one chat message to the active session.
pub fn submit_chat(app: &AppState, message: String) -> Result<(), Rejection> {
    let (open, typing) = app
        .view_state
        .lock()
        .map(|s| (s.chat_open(), s.typing))
        .unwrap_or((false, false));
    if !open {
        return Err(Rejection::NoSession);
    }
    if typing {
        return Err(Rejection::Busy);
    }
    if message.trim().is_empty() {
        return Err(Rejection::InvalidInput);
    }
    app.intent_tx
        .try_send(Intent::Chat { message })
        .map_err(|_| Rejection::Unavailable)
}

/// Apply a control action and resynchronize clients.
pub fn apply_control(app: &AppState, action: ControlAction) {
    match action {
        ControlAction::Reset => {
            ui::reset(&app.view_state);
            let _ = app.intent_tx.try_send(Intent::Reset);
        }
        ControlAction::AcceptDisclaimer => ui::accept_disclaimer(&app.view_state),
        ControlAction::SetLanguage(language) => {
            if !ui::set_language(&app.view_state, language) {
                debug!("Ignoring language switch to {language} outside IDLE");
            }
        }
    }
    app.broadcast_snapshot();
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_trace::ui::ScanStatus;

    fn app() -> (AppState, mpsc::Receiver<Intent>) {
        let (intent_tx, intent_rx) = mpsc::channel(4);
        let (broadcast_tx, _) = broadcast::channel(16);
        let app = AppState {
            view_state: Arc::new(Mutex::new(ViewState::default())),
            intent_tx,
            broadcast_tx,
        };
        (app, intent_rx)
    }

    #[test]
    fn control_action_deserializes() {
        let reset: ControlAction = serde_json::from_str(r#""reset""#).unwrap();
        assert!(matches!(reset, ControlAction::Reset));
        let lang: ControlAction = serde_json::from_str(r#"{"set_language":"EN"}"#).unwrap();
        assert!(matches!(lang, ControlAction::SetLanguage(Language::En)));
    }

    #[test]
    fn lookup_requires_disclaimer() {
        let (app, mut rx) = app();
        assert_eq!(
            submit_lookup(&app, "@alice"),
            Err(Rejection::DisclaimerPending)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn lookup_enters_scanning_and_forwards() {
        let (app, mut rx) = app();
        apply_control(&app, ControlAction::AcceptDisclaimer);
        submit_lookup(&app, " @alice ").unwrap();

        let s = app.view_state.lock().unwrap();
        assert_eq!(s.status, ScanStatus::Scanning);
        match rx.try_recv().unwrap() {
            Intent::Lookup {
                handle,
                language,
                lookup_id,
            } => {
                assert_eq!(handle.bare(), "alice");
                assert_eq!(language, Language::Ru);
                assert_eq!(lookup_id, s.lookup_id);
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn invalid_handle_shows_error_view() {
        let (app, mut rx) = app();
        apply_control(&app, ControlAction::AcceptDisclaimer);
        assert_eq!(submit_lookup(&app, "alice"), Err(Rejection::InvalidInput));

        let s = app.view_state.lock().unwrap();
        assert_eq!(s.status, ScanStatus::Error);
        assert_eq!(
            s.error.as_deref(),
            Some("SYNTAX ERROR: HANDLE MUST START WITH '@'")
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn chat_needs_open_session() {
        let (app, _rx) = app();
        assert_eq!(
            submit_chat(&app, "hello".into()),
            Err(Rejection::NoSession)
        );
    }

    #[test]
    fn chat_waits_for_session_and_pending_reply() {
        let (app, mut rx) = app();
        let id = ui::begin_lookup(&app.view_state);
        {
            let mut s = app.view_state.lock().unwrap();
            s.persona = Some(neon_trace::normalize::fallback_persona(
                &Handle::parse("@alice").unwrap(),
                Language::En,
                vec![],
            ));
            s.status = ScanStatus::Complete;
        }
        assert_eq!(
            submit_chat(&app, "too early".into()),
            Err(Rejection::NoSession)
        );

        assert!(ui::open_chat(&app.view_state, id));
        app.view_state.lock().unwrap().typing = true;
        assert_eq!(submit_chat(&app, "again".into()), Err(Rejection::Busy));

        app.view_state.lock().unwrap().typing = false;
        submit_chat(&app, "now".into()).unwrap();
        assert!(matches!(rx.try_recv().unwrap(), Intent::Chat { message } if message == "now"));
    }

    #[test]
    fn reset_forwards_to_driver() {
        let (app, mut rx) = app();
        apply_control(&app, ControlAction::Reset);
        assert!(matches!(rx.try_recv().unwrap(), Intent::Reset));
    }
}
