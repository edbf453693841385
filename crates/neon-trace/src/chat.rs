//! Follow-up chat about a revealed persona.
//!
//! The completions endpoint is stateless, so [`ChatSession`] owns the running
//! conversation (system context plus prior turns) and resends it on every
//! turn. The visible transcript is kept separately: it opens with a greeting
//! the model never sees and keeps user messages whose turn failed.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::tracing::generate_message_id;
use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::events::{EventHandler, TraceEvent};
use crate::i18n::Language;
use crate::pacing::with_floor;
use crate::persona::Persona;
use crate::prompt::chat_instruction;
use crate::{ChatRequest, Message, ModelBackend, Plugin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Assistant => f.write_str("assistant"),
        }
    }
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: generate_message_id(),
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// A stateful conversation seeded with one persona.
pub struct ChatSession {
    backend: Arc<dyn ModelBackend>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    plugins: Vec<Plugin>,
    floor: Duration,
    lang: Language,
    conversation: Vec<Message>,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    /// Open a session whose hidden context is the serialized `persona`.
    pub fn open(
        backend: Arc<dyn ModelBackend>,
        persona: &Persona,
        lang: Language,
        config: &TraceConfig,
    ) -> Self {
        debug!("Opening chat session for {}", persona.handle);
        Self {
            backend,
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            plugins: config.plugins(),
            floor: config.chat_floor,
            lang,
            conversation: vec![Message::system(chat_instruction(persona, lang))],
            transcript: vec![ChatMessage::assistant(lang.labels().chat_greeting)],
        }
    }

    /// Everything shown so far, greeting first.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// A failed call is recovered: the reply is the localized connectivity
    /// message, the failed turn is dropped from the conversation, and the
    /// session stays usable. Only an empty message is an error.
    pub async fn submit(
        &mut self,
        text: &str,
        handler: &dyn EventHandler,
    ) -> Result<ChatMessage, TraceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TraceError::EmptyMessage);
        }

        let user = ChatMessage::user(text);
        self.transcript.push(user.clone());
        handler.on_event(&TraceEvent::ChatMessage(&user));
        handler.on_event(&TraceEvent::Typing(true));

        self.conversation.push(Message::user(text));
        let request = ChatRequest {
            model: Some(self.model.clone()),
            messages: self.conversation.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            plugins: Some(self.plugins.clone()),
            ..Default::default()
        };

        let outcome = with_floor(self.floor, self.backend.complete(&request))
            .await
            .map_err(TraceError::Chat)
            .and_then(|completion| {
                if let Some(usage) = &completion.usage {
                    handler.on_event(&TraceEvent::TokenUsage {
                        model: &self.model,
                        prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                        completion_tokens: usage.completion_tokens.unwrap_or(0),
                    });
                }
                completion
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| TraceError::Chat("empty reply".into()))
            });

        let reply_text = match outcome {
            Ok(reply) => {
                self.conversation.push(Message::assistant_text(&reply));
                reply
            }
            Err(e) => {
                warn!("Chat turn failed: {e}");
                self.conversation.pop();
                e.localized(self.lang).to_string()
            }
        };

        handler.on_event(&TraceEvent::Typing(false));
        let reply = ChatMessage::assistant(reply_text);
        self.transcript.push(reply.clone());
        handler.on_event(&TraceEvent::ChatMessage(&reply));
        Ok(reply)
    }
}
