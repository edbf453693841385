//! The task that turns forwarded intents into lookups and chat turns.
//!
//! Each lookup runs on its own task. A newer lookup does not cancel an
//! older one; it bumps the view's lookup id, and every handler of the older
//! lookup goes quiet. Chat turns and resets go through a single worker, so
//! they apply one at a time in the order they were submitted.
//!
//! Chat only opens in the view after the session is installed. A message
//! that still finds no session is answered with the connectivity message
//! rather than dropped.

use std::sync::{Arc, Mutex};

use neon_trace::chat::{ChatMessage, ChatSession};
use neon_trace::config::TraceConfig;
use neon_trace::events::{CompositeEventHandler, EventHandler, LoggingHandler, TraceEvent};
use neon_trace::i18n::Language;
use neon_trace::lookup::{Handle, Lookup};
use neon_trace::ui::{self, ViewEventHandler, ViewState};
use neon_trace::ModelBackend;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::broadcast::{WebBroadcastHandler, WsMessage};
use crate::intent::Intent;
use crate::snapshot::StateSnapshot;

/// Chat turns buffered ahead of the worker.
const CHAT_QUEUE: usize = 32;

struct ActiveChat {
    lookup_id: u64,
    session: ChatSession,
}

/// Work the chat worker applies in order.
enum ChatJob {
    Turn(String),
    Close,
}

#[derive(Clone)]
pub struct Driver {
    backend: Arc<dyn ModelBackend>,
    config: Arc<TraceConfig>,
    view_state: Arc<Mutex<ViewState>>,
    broadcast_tx: broadcast::Sender<WsMessage>,
    chat: Arc<tokio::sync::Mutex<Option<ActiveChat>>>,
}

impl Driver {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        config: TraceConfig,
        view_state: Arc<Mutex<ViewState>>,
        broadcast_tx: broadcast::Sender<WsMessage>,
    ) -> Self {
        Self {
            backend,
            config: Arc::new(config),
            view_state,
            broadcast_tx,
            chat: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Consume intents until every sender is dropped.
    pub async fn run(self, mut intents: mpsc::Receiver<Intent>) {
        let (chat_tx, chat_rx) = mpsc::channel(CHAT_QUEUE);
        let worker = tokio::spawn(self.clone().chat_worker(chat_rx));

        while let Some(intent) = intents.recv().await {
            let job = match intent {
                Intent::Lookup {
                    handle,
                    language,
                    lookup_id,
                } => {
                    let driver = self.clone();
                    tokio::spawn(async move { driver.lookup(handle, language, lookup_id).await });
                    continue;
                }
                Intent::Chat { message } => ChatJob::Turn(message),
                Intent::Reset => ChatJob::Close,
            };
            if chat_tx.send(job).await.is_err() {
                warn!("Chat worker stopped, dropping chat intent");
            }
        }

        drop(chat_tx);
        let _ = worker.await;
        info!("Intent channel closed, driver stopping");
    }

    async fn chat_worker(self, mut jobs: mpsc::Receiver<ChatJob>) {
        while let Some(job) = jobs.recv().await {
            match job {
                ChatJob::Turn(message) => self.chat(message).await,
                ChatJob::Close => *self.chat.lock().await = None,
            }
        }
    }

    fn handler(&self, lookup_id: u64) -> CompositeEventHandler {
        CompositeEventHandler::new()
            .with(LoggingHandler)
            .with(ViewEventHandler::new(self.view_state.clone(), lookup_id))
            .with(WebBroadcastHandler::new(
                self.broadcast_tx.clone(),
                self.view_state.clone(),
                lookup_id,
            ))
    }

    /// The current lookup id, and whether the view believes chat is open.
    fn current(&self) -> Option<(u64, bool, Language)> {
        self.view_state
            .lock()
            .ok()
            .map(|s| (s.lookup_id, s.chat_open(), s.language))
    }

    fn broadcast_snapshot(&self) {
        let Ok(state) = self.view_state.lock() else {
            return;
        };
        let data = StateSnapshot::from_view_state(&state).to_json();
        drop(state);
        let _ = self.broadcast_tx.send(WsMessage::Snapshot { data });
    }

    async fn lookup(&self, handle: Handle, language: Language, lookup_id: u64) {
        let handler = self.handler(lookup_id);
        let lookup = Lookup::new(self.backend.as_ref(), &self.config, language);
        let Ok(reveal) = lookup.run(&handle, &handler).await else {
            return;
        };

        let session = ChatSession::open(
            self.backend.clone(),
            &reveal.persona,
            language,
            &self.config,
        );
        let mut chat = self.chat.lock().await;
        if self.current().map(|(id, ..)| id) != Some(lookup_id) {
            debug!("[{}] superseded, discarding chat session", reveal.trace_id);
            return;
        }
        for message in session.transcript() {
            handler.on_event(&TraceEvent::ChatMessage(message));
        }
        *chat = Some(ActiveChat { lookup_id, session });
        if ui::open_chat(&self.view_state, lookup_id) {
            self.broadcast_snapshot();
        }
    }

    async fn chat(&self, message: String) {
        let mut chat = self.chat.lock().await;
        let Some((current, open, language)) = self.current() else {
            return;
        };
        match chat.as_mut() {
            Some(active) if active.lookup_id == current => {
                let handler = self.handler(current);
                if let Err(e) = active.session.submit(&message, &handler).await {
                    debug!("Chat message rejected: {e}");
                }
            }
            _ => {
                *chat = None;
                if !open {
                    debug!("Chat message for a dismissed view, dropping it");
                    return;
                }
                warn!("Chat message arrived with no session installed");
                let handler = self.handler(current);
                handler.on_event(&TraceEvent::ChatMessage(&ChatMessage::user(message.trim())));
                let reply = ChatMessage::assistant(language.labels().chat_network_error);
                handler.on_event(&TraceEvent::ChatMessage(&reply));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_trace::normalize::fallback_persona;
    use neon_trace::ui::ScanStatus;
    use neon_trace::{ChatCompletion, ChatRequest, CompletionFuture};
    use std::collections::VecDeque;

    struct ScriptedBackend(Mutex<VecDeque<Result<ChatCompletion, String>>>);

    impl ModelBackend for ScriptedBackend {
        fn complete<'a>(&'a self, _request: &'a ChatRequest) -> CompletionFuture<'a> {
            let reply = self
                .0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".into()));
            Box::pin(async move { reply })
        }
    }

    fn driver(replies: Vec<Result<ChatCompletion, String>>) -> Driver {
        let (tx, _) = broadcast::channel(64);
        Driver::new(
            Arc::new(ScriptedBackend(Mutex::new(replies.into()))),
            TraceConfig::instant(),
            Arc::new(Mutex::new(ViewState::default())),
            tx,
        )
    }

    /// Put the view in COMPLETE with a persona, as a reveal does.
    fn reveal(driver: &Driver) -> u64 {
        let id = ui::begin_lookup(&driver.view_state);
        let mut s = driver.view_state.lock().unwrap();
        s.language = Language::En;
        s.persona = Some(fallback_persona(
            &Handle::parse("@alice").unwrap(),
            Language::En,
            vec![],
        ));
        s.status = ScanStatus::Complete;
        id
    }

    fn transcript(driver: &Driver) -> Vec<String> {
        driver
            .view_state
            .lock()
            .unwrap()
            .transcript
            .iter()
            .map(|m| format!("{}:{}", m.sender, m.text))
            .collect()
    }

    #[tokio::test]
    async fn lookup_opens_chat_after_installing_session() {
        let driver = driver(vec![Ok(ChatCompletion::text(r#"{"found": true}"#))]);
        let id = ui::begin_lookup(&driver.view_state);

        driver
            .lookup(Handle::parse("@alice").unwrap(), Language::En, id)
            .await;

        let s = driver.view_state.lock().unwrap();
        assert!(s.chat_open());
        assert_eq!(s.transcript.len(), 1);
        assert!(driver.chat.try_lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn superseded_lookup_leaves_chat_closed() {
        let driver = driver(vec![Ok(ChatCompletion::text(r#"{"found": true}"#))]);
        let stale = ui::begin_lookup(&driver.view_state);
        ui::begin_lookup(&driver.view_state);

        driver
            .lookup(Handle::parse("@alice").unwrap(), Language::En, stale)
            .await;

        assert!(!driver.view_state.lock().unwrap().chat_open());
        assert!(driver.chat.try_lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn message_without_installed_session_is_answered() {
        let driver = driver(vec![]);
        let id = reveal(&driver);
        assert!(ui::open_chat(&driver.view_state, id));

        driver.chat("anyone there?".into()).await;

        assert_eq!(
            transcript(&driver),
            ["user:anyone there?", "assistant:Connection drop... Network error."]
        );
    }

    #[tokio::test]
    async fn message_for_dismissed_view_is_dropped() {
        let driver = driver(vec![]);
        reveal(&driver);
        ui::reset(&driver.view_state);

        driver.chat("late".into()).await;

        assert!(transcript(&driver).is_empty());
    }

    #[tokio::test]
    async fn chat_turns_apply_in_submission_order() {
        let driver = driver(vec![
            Ok(ChatCompletion::text(r#"{"found": true}"#)),
            Ok(ChatCompletion::text("first reply")),
            Ok(ChatCompletion::text("second reply")),
        ]);
        let id = ui::begin_lookup(&driver.view_state);
        driver
            .lookup(Handle::parse("@alice").unwrap(), Language::En, id)
            .await;

        let (tx, rx) = mpsc::channel(8);
        tx.send(Intent::Chat { message: "one".into() }).await.unwrap();
        tx.send(Intent::Chat { message: "two".into() }).await.unwrap();
        tx.send(Intent::Reset).await.unwrap();
        drop(tx);
        driver.clone().run(rx).await;

        let lines = transcript(&driver);
        assert_eq!(
            &lines[1..],
            [
                "user:one",
                "assistant:first reply",
                "user:two",
                "assistant:second reply"
            ]
        );
        assert!(driver.chat.try_lock().unwrap().is_none());
    }
}
