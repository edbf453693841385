//! OSINT-themed persona lookups over a hosted LLM.
//!
//! `neon-trace` takes a social-media handle, asks a web-search-enabled model
//! to role-play a "deep scan" of the public footprint behind it, and shapes
//! whatever text comes back into a [`Persona`](persona::Persona) that is
//! always safe to render. A follow-up [`ChatSession`](chat::ChatSession) lets
//! the user keep questioning the model with the dossier as hidden context.
//!
//! Everything talks to the [OpenRouter](https://openrouter.ai/) chat
//! completions API through the [`ModelBackend`] seam, so front-ends and tests
//! can swap in their own backend.
//!
//! # Getting started
//!
//! ```ignore
//! use neon_trace::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("OPENROUTER_KEY").unwrap();
//!     let client = OpenRouterClient::new(api_key)?;
//!     let config = TraceConfig::default();
//!
//!     let handle = Handle::parse("@alice").map_err(|e| e.to_string())?;
//!     let lookup = Lookup::new(&client, &config, Language::En);
//!     let reveal = lookup
//!         .run(&handle, &LoggingHandler)
//!         .await
//!         .map_err(|e| e.to_string())?;
//!
//!     println!("{}", serde_json::to_string_pretty(&reveal.persona).unwrap());
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Turning a model reply into a persona:** [`normalize::normalize_reply`].
//!   This is the only place with real rules; read its docs before changing
//!   anything in [`persona`].
//! - **What is sent to the model:** [`prompt::lookup_prompt`] and
//!   [`prompt::chat_instruction`].
//! - **The scan animation:** [`schedule::ScanSchedule`] is a declarative list
//!   of `{offset, effect}` steps; [`pacing`] holds the minimum-reveal-time
//!   rendezvous.
//! - **Running a lookup end to end:** [`lookup::Lookup`].
//! - **Observing progress:** implement [`EventHandler`](events::EventHandler),
//!   or compose [`ViewEventHandler`](ui::ViewEventHandler) with
//!   [`LoggingHandler`](events::LoggingHandler).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`persona`] | Persona record, platforms, citations |
//! | [`normalize`] | Reply → persona repair pipeline |
//! | [`prompt`] | Lookup prompt and chat instruction builders |
//! | [`chat`] | Stateful follow-up chat session |
//! | [`lookup`] | Handle validation and the lookup runner |
//! | [`schedule`] | Deep-scan log schedule |
//! | [`pacing`] | Minimum reveal time |
//! | [`events`] | Trace events and handlers |
//! | [`ui`] | View state shared with front-ends |
//! | [`i18n`] | EN/RU label table |
//! | [`config`] | [`TraceConfig`](config::TraceConfig) |
//! | [`api`] | Trace ids and usage accounting |

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod i18n;
pub mod lookup;
pub mod normalize;
pub mod pacing;
pub mod persona;
pub mod prelude;
pub mod prompt;
pub mod schedule;
pub mod ui;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Model used for persona generation.
pub const DEFAULT_MODEL: &str = "google/gemini-3-pro-preview";

/// Model used for follow-up chat turns.
pub const CHAT_MODEL: &str = "google/gemini-2.5-flash";

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unused optional fields are omitted from
/// serialization.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<Plugin>>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}
fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

// ── Plugin types ───────────────────────────────────────────────────

/// A strongly-typed OpenRouter plugin configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "id")]
pub enum Plugin {
    /// Web search plugin. Results come back as `url_citation` annotations.
    #[serde(rename = "web")]
    Web {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_results: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        search_prompt: Option<String>,
    },
}

impl Plugin {
    /// Convenience constructor for a web-search plugin with defaults.
    pub fn web() -> Self {
        Plugin::Web {
            max_results: None,
            search_prompt: None,
        }
    }

    /// Convenience constructor for a web-search plugin with options.
    pub fn web_with(max_results: Option<u32>, search_prompt: Option<String>) -> Self {
        Plugin::Web {
            max_results,
            search_prompt,
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
    annotations: Option<Vec<Annotation>>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`ModelBackend::complete`].
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub annotations: Vec<Annotation>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// A completion carrying only reply text. Handy for scripted backends.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Attach a `url_citation` annotation.
    pub fn with_citation(mut self, url: impl Into<String>, title: Option<&str>) -> Self {
        self.annotations.push(Annotation::url_citation(url, title));
        self
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// URL citation annotation returned by the web-search plugin.
#[derive(Deserialize, Debug, Clone)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub annotation_type: Option<String>,
    pub url_citation: Option<UrlCitation>,
}

impl Annotation {
    pub fn url_citation(url: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            annotation_type: Some("url_citation".into()),
            url_citation: Some(UrlCitation {
                url: url.into(),
                title: title.map(str::to_string),
            }),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UrlCitation {
    pub url: String,
    pub title: Option<String>,
}

// ── Backend seam ───────────────────────────────────────────────────

/// Boxed future returned by [`ModelBackend::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatCompletion, String>> + Send + 'a>>;

/// Anything that can answer a chat completion request.
///
/// [`OpenRouterClient`] is the production implementation. Lookups and chat
/// sessions only ever see this trait.
pub trait ModelBackend: Send + Sync {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
pub struct OpenRouterClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) referer: String,
    pub(crate) title: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_headers(api_key, "https://github.com/neon-trace", "neon-trace")
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("neon-trace/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        let model_label = body.model.as_deref().unwrap_or("(none)");
        let plugin_count = body.plugins.as_ref().map_or(0, |p| p.len());
        debug!(
            "LLM request: model={}, messages={}, plugins={}, max_tokens={}",
            model_label,
            body.messages.len(),
            plugin_count,
            body.max_tokens,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("OpenRouter API HTTP {status}: {text}"));
        }

        parse_completion(&text)
    }
}

impl ModelBackend for OpenRouterClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
        Box::pin(self.chat(request))
    }
}

/// Parse a successful response body into a [`ChatCompletion`].
fn parse_completion(text: &str) -> Result<ChatCompletion, String> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| format!("failed to parse response: {e}"))?;

    if let Some(err) = parsed.error {
        return Err(format!("OpenRouter API error: {}", err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    match parsed.choices.and_then(|c| c.into_iter().next()) {
        Some(c) => {
            debug!(
                "LLM output: {} chars text",
                c.message.content.as_ref().map_or(0, |s| s.len())
            );
            Ok(ChatCompletion {
                content: c.message.content,
                usage: parsed.usage,
                annotations: c.message.annotations.unwrap_or_default(),
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                usage: parsed.usage,
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content.as_deref(), Some("hello"));

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant_text("reply");
        assert_eq!(assist.role, MessageRole::Assistant);
        assert_eq!(assist.content.as_deref(), Some("reply"));
    }

    #[test]
    fn chat_request_default_skips_none_fields() {
        let req = ChatRequest {
            model: Some("test-model".into()),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("plugins").is_none());
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn web_plugin_serializes_with_id() {
        let req = ChatRequest {
            model: Some("m".into()),
            messages: vec![],
            plugins: Some(vec![Plugin::web()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["plugins"][0]["id"], "web");
        assert!(json["plugins"][0].get("max_results").is_none());
    }

    #[test]
    fn parse_completion_extracts_text_and_citations() {
        let body = r#"{
            "choices": [{
                "message": {
                    "content": "{\"found\":true}",
                    "annotations": [
                        {"type": "url_citation", "url_citation": {"url": "https://urlebird.com/user/alice/", "title": "alice"}}
                    ]
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.content.as_deref(), Some("{\"found\":true}"));
        assert_eq!(completion.annotations.len(), 1);
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
        assert_eq!(completion.usage.unwrap().total_tokens, Some(15));
    }

    #[test]
    fn parse_completion_surfaces_api_error() {
        let body = r#"{"error": {"message": "quota exceeded"}}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(err.contains("quota exceeded"));
    }

    #[test]
    fn parse_completion_without_choices_is_empty() {
        let completion = parse_completion("{}").unwrap();
        assert!(completion.content.is_none());
        assert!(completion.annotations.is_empty());
    }
}
