//! Handle validation and the lookup runner.
//!
//! A lookup is one generation call raced against the scan schedule:
//!
//! ```text
//! LookupStarted ─▶ Status(SCANNING) ─▶ scan steps … ─▶ Log + Revealed + Status(COMPLETE)
//!                                                  └─▶ Failed + Status(ERROR)
//! ```
//!
//! The result is held back until the configured floor has elapsed, and any
//! scan step that has not fired by then is dropped.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::tracing::generate_trace_id;
use crate::config::TraceConfig;
use crate::error::{HandleError, TraceError};
use crate::events::{EventHandler, TraceEvent};
use crate::i18n::Language;
use crate::normalize::normalize_reply;
use crate::pacing::with_floor;
use crate::persona::{Persona, Source};
use crate::prompt::lookup_prompt;
use crate::ui::ScanStatus;
use crate::{ChatRequest, Message, ModelBackend};

/// Log line emitted right before a successful reveal.
pub const RENDERED_LINE: &str = "DATA RENDERED SUCCESSFULLY.";

/// A validated social-media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    raw: String,
    bare: String,
}

impl Handle {
    /// Validate user input.
    ///
    /// Surrounding whitespace is ignored. The handle must start with `@`,
    /// and the rest must be a username: ASCII letters, digits, `_` and `.`,
    /// with no two dots in a row. That keeps every profile URL built from
    /// it well-formed.
    pub fn parse(input: &str) -> Result<Self, HandleError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(HandleError::Empty);
        }
        let Some(bare) = raw.strip_prefix('@') else {
            return Err(HandleError::MissingSigil);
        };
        if bare.is_empty() {
            return Err(HandleError::Empty);
        }
        if !is_username(bare) {
            return Err(HandleError::InvalidCharacters);
        }
        Ok(Self {
            raw: raw.to_string(),
            bare: bare.to_string(),
        })
    }

    /// The trimmed input, sigil included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The handle without its sigil.
    pub fn bare(&self) -> &str {
        &self.bare
    }

    pub fn sigiled(&self) -> String {
        format!("@{}", self.bare)
    }
}

fn is_username(bare: &str) -> bool {
    bare.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !bare.contains("..")
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The outcome of a successful lookup.
#[derive(Debug, Clone)]
pub struct Reveal {
    pub trace_id: String,
    pub persona: Persona,
    /// Time from start to reveal, floor included.
    pub elapsed: Duration,
}

/// Runs lookups against one backend with one configuration.
pub struct Lookup<'a> {
    backend: &'a dyn ModelBackend,
    config: &'a TraceConfig,
    lang: Language,
}

impl<'a> Lookup<'a> {
    pub fn new(backend: &'a dyn ModelBackend, config: &'a TraceConfig, lang: Language) -> Self {
        Self {
            backend,
            config,
            lang,
        }
    }

    /// The generation request for `handle`.
    pub fn request(&self, handle: &Handle) -> ChatRequest {
        ChatRequest {
            model: Some(self.config.model.clone()),
            messages: vec![Message::user(lookup_prompt(handle, self.lang))],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            plugins: Some(self.config.plugins()),
            ..Default::default()
        }
    }

    /// Run one lookup, reporting progress to `handler`.
    ///
    /// An unparseable reply still succeeds with a fallback persona. Only a
    /// failed call returns [`TraceError::Generation`].
    pub async fn run(
        &self,
        handle: &Handle,
        handler: &dyn EventHandler,
    ) -> Result<Reveal, TraceError> {
        let trace_id = generate_trace_id();
        handler.on_event(&TraceEvent::LookupStarted {
            trace_id: &trace_id,
            handle: handle.raw(),
        });
        handler.on_event(&TraceEvent::Status(ScanStatus::Scanning));

        let request = self.request(handle);
        let started = Instant::now();
        let generation = with_floor(self.config.lookup_floor, self.backend.complete(&request));
        tokio::pin!(generation);

        let mut steps = self.config.schedule.steps().iter().peekable();
        let outcome = loop {
            let Some(step) = steps.peek().copied() else {
                break (&mut generation).await;
            };
            let due = started + step.offset;
            if Instant::now() < due {
                tokio::select! {
                    biased;
                    () = tokio::time::sleep_until(due) => {}
                    outcome = &mut generation => break outcome,
                }
            }
            step.fire(handle.raw(), handler);
            steps.next();
        };
        let elapsed = started.elapsed();
        let dropped = steps.count();
        if dropped > 0 {
            info!("[{trace_id}] revealed before {dropped} scan step(s) fired");
        }

        match outcome {
            Ok(completion) => {
                if let Some(usage) = &completion.usage {
                    handler.on_event(&TraceEvent::TokenUsage {
                        model: &self.config.model,
                        prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                        completion_tokens: usage.completion_tokens.unwrap_or(0),
                    });
                }
                let sources = Source::from_annotations(&completion.annotations);
                let raw = completion.content.as_deref().unwrap_or("{}");
                let persona = normalize_reply(raw, sources, handle, self.lang);

                info!(
                    "[{trace_id}] {} revealed in {:.1}s",
                    handle.raw(),
                    elapsed.as_secs_f64()
                );
                handler.on_event(&TraceEvent::Log(RENDERED_LINE));
                handler.on_event(&TraceEvent::Revealed(&persona));
                handler.on_event(&TraceEvent::Status(ScanStatus::Complete));
                Ok(Reveal {
                    trace_id,
                    persona,
                    elapsed,
                })
            }
            Err(detail) => {
                warn!("[{trace_id}] generation failed for {}: {detail}", handle.raw());
                let err = TraceError::Generation(detail);
                let detail = err.to_string();
                handler.on_event(&TraceEvent::Failed {
                    message: err.localized(self.lang),
                    detail: &detail,
                });
                handler.on_event(&TraceEvent::Status(ScanStatus::Error));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ChatCompletion, CompletionFuture, UsageInfo};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays canned results and records every request.
    pub(crate) struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatCompletion, String>>>,
        pub(crate) requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(replies: Vec<Result<ChatCompletion, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ModelBackend for ScriptedBackend {
        fn complete<'a>(&'a self, request: &'a ChatRequest) -> CompletionFuture<'a> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".into()));
            Box::pin(async move { reply })
        }
    }

    /// Records events as short strings.
    #[derive(Default)]
    pub(crate) struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        pub(crate) fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl EventHandler for Recorder {
        fn on_event(&self, event: &TraceEvent<'_>) {
            let entry = match event {
                TraceEvent::LookupStarted { handle, .. } => format!("start:{handle}"),
                TraceEvent::Status(s) => format!("status:{s}"),
                TraceEvent::Log(line) => format!("log:{line}"),
                TraceEvent::TokenUsage { prompt_tokens, .. } => format!("usage:{prompt_tokens}"),
                TraceEvent::Revealed(p) => format!("revealed:{}", p.found),
                TraceEvent::Failed { message, .. } => format!("failed:{message}"),
                TraceEvent::ChatMessage(m) => format!("chat:{}:{}", m.sender, m.text),
                TraceEvent::Typing(t) => format!("typing:{t}"),
            };
            self.0.lock().unwrap().push(entry);
        }
    }

    // ── Handle ──

    #[test]
    fn handle_parse_trims_and_strips_sigil() {
        let handle = Handle::parse("  @alice ").unwrap();
        assert_eq!(handle.raw(), "@alice");
        assert_eq!(handle.bare(), "alice");
        assert_eq!(handle.sigiled(), "@alice");
        assert_eq!(handle.to_string(), "@alice");
    }

    #[test]
    fn handle_parse_rejects_bad_input() {
        assert_eq!(Handle::parse("   "), Err(HandleError::Empty));
        assert_eq!(Handle::parse("@"), Err(HandleError::Empty));
        assert_eq!(Handle::parse("alice"), Err(HandleError::MissingSigil));
        assert_eq!(Handle::parse("alice@"), Err(HandleError::MissingSigil));
    }

    #[test]
    fn handle_parse_rejects_non_username_characters() {
        for input in ["@a...b", "@a..b", "@a\u{2026}", "@ali ce", "@@alice", "@al/ice", "@алиса"] {
            assert_eq!(
                Handle::parse(input),
                Err(HandleError::InvalidCharacters),
                "{input:?} should be rejected"
            );
        }
        let dotted = Handle::parse("@alice.b_2").unwrap();
        assert_eq!(dotted.bare(), "alice.b_2");
    }

    // ── Request ──

    #[test]
    fn request_uses_generation_model_and_web_plugin() {
        let backend = ScriptedBackend::new(vec![]);
        let config = TraceConfig::instant();
        let lookup = Lookup::new(&backend, &config, Language::En);
        let request = lookup.request(&Handle::parse("@alice").unwrap());
        assert_eq!(request.model.as_deref(), Some(crate::DEFAULT_MODEL));
        assert_eq!(request.messages.len(), 1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["plugins"][0]["id"], "web");
    }

    // ── Run ──

    #[tokio::test]
    async fn successful_lookup_reveals_normalized_persona() {
        let backend = ScriptedBackend::new(vec![Ok(ChatCompletion {
            usage: Some(UsageInfo {
                prompt_tokens: Some(900),
                completion_tokens: Some(300),
                total_tokens: Some(1200),
            }),
            ..ChatCompletion::text("```json\n{\"found\": false, \"analysis\": \"quiet\"}\n```")
                .with_citation("https://urlebird.com/user/alice/", Some("alice"))
        })]);
        let config = TraceConfig::instant();
        let handler = Recorder::default();

        let reveal = Lookup::new(&backend, &config, Language::En)
            .run(&Handle::parse("@alice").unwrap(), &handler)
            .await
            .unwrap();

        assert!(reveal.persona.found, "mirror citation should promote found");
        assert_eq!(reveal.persona.sources.len(), 1);

        let events = handler.events();
        assert_eq!(events[0], "start:@alice");
        assert_eq!(events[1], "status:SCANNING");
        assert_eq!(events[2], "log:INITIALIZING TARGET LOCK: @alice");
        assert!(events.contains(&"status:DECRYPTING".to_string()));
        let tail: Vec<&str> = events.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            [
                "usage:900",
                "log:DATA RENDERED SUCCESSFULLY.",
                "revealed:true",
                "status:COMPLETE"
            ]
        );
    }

    #[tokio::test]
    async fn instant_schedule_fires_every_step_before_reveal() {
        let backend = ScriptedBackend::new(vec![Ok(ChatCompletion::text("{}"))]);
        let config = TraceConfig::instant();
        let handler = Recorder::default();

        Lookup::new(&backend, &config, Language::En)
            .run(&Handle::parse("@alice").unwrap(), &handler)
            .await
            .unwrap();

        let logs = handler
            .events()
            .iter()
            .filter(|e| e.starts_with("log:"))
            .count();
        assert_eq!(logs, config.schedule.steps().len() + 1);
    }

    #[tokio::test]
    async fn failed_call_ends_in_error_without_persona() {
        let backend = ScriptedBackend::new(vec![Err("OpenRouter API HTTP 503: down".into())]);
        let config = TraceConfig::instant();
        let handler = Recorder::default();

        let err = Lookup::new(&backend, &config, Language::En)
            .run(&Handle::parse("@alice").unwrap(), &handler)
            .await
            .unwrap_err();

        assert!(matches!(err, TraceError::Generation(ref d) if d.contains("503")));
        let events = handler.events();
        assert!(!events.iter().any(|e| e.starts_with("revealed:")));
        assert_eq!(
            events[events.len() - 2],
            "failed:CONNECTION TERMINATED. TARGET UNRESPONSIVE."
        );
        assert_eq!(events[events.len() - 1], "status:ERROR");
    }

    #[tokio::test]
    async fn missing_content_is_treated_as_empty_object() {
        let backend = ScriptedBackend::new(vec![Ok(ChatCompletion::default())]);
        let config = TraceConfig::instant();
        let reveal = Lookup::new(&backend, &config, Language::Ru)
            .run(&Handle::parse("@bob").unwrap(), &crate::events::NoopHandler)
            .await
            .unwrap();
        assert!(!reveal.persona.found);
        assert_eq!(reveal.persona.real_name, "UNKNOWN");
        assert_eq!(reveal.persona.handle, "@bob");
    }

    #[tokio::test]
    async fn reveal_waits_for_floor_and_drops_late_steps() {
        let backend = ScriptedBackend::new(vec![Ok(ChatCompletion::text("not json"))]);
        let schedule = crate::schedule::ScanSchedule::new(vec![
            crate::schedule::ScanStep::new(0, "first"),
            crate::schedule::ScanStep::new(5_000, "too late"),
        ]);
        let config = TraceConfig::instant()
            .with_lookup_floor(Duration::from_millis(50))
            .with_schedule(schedule);
        let handler = Recorder::default();

        let reveal = Lookup::new(&backend, &config, Language::En)
            .run(&Handle::parse("@alice").unwrap(), &handler)
            .await
            .unwrap();

        assert!(reveal.elapsed >= Duration::from_millis(50));
        assert_eq!(reveal.persona.real_name, "RUNTIME_ERROR");
        let events = handler.events();
        assert!(events.contains(&"log:first".to_string()));
        assert!(!events.contains(&"log:too late".to_string()));
    }
}
