//! Runtime configuration for lookups and chat sessions.
//!
//! ```ignore
//! let config = TraceConfig::default()
//!     .with_model("google/gemini-2.5-pro")
//!     .with_web_max_results(8);
//! ```
//!
//! Tests use [`TraceConfig::instant`] so nothing sleeps.

use std::time::Duration;

use crate::schedule::ScanSchedule;
use crate::{CHAT_MODEL, DEFAULT_MODEL, Plugin};

/// Minimum time between starting a lookup and revealing its result.
pub const LOOKUP_FLOOR: Duration = Duration::from_secs(12);

/// Minimum time between submitting a chat message and showing the reply.
pub const CHAT_FLOOR: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Model for persona generation.
    pub model: String,
    /// Model for follow-up chat turns.
    pub chat_model: String,
    /// Completion token cap (0 = provider default).
    pub max_tokens: u32,
    /// Sampling temperature (0 = provider default).
    pub temperature: f32,
    /// Web-search result cap per call (`None` = plugin default).
    pub web_max_results: Option<u32>,
    pub lookup_floor: Duration,
    pub chat_floor: Duration,
    pub schedule: ScanSchedule,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            chat_model: CHAT_MODEL.into(),
            max_tokens: 0,
            temperature: 0.0,
            web_max_results: None,
            lookup_floor: LOOKUP_FLOOR,
            chat_floor: CHAT_FLOOR,
            schedule: ScanSchedule::deep_scan(),
        }
    }
}

impl TraceConfig {
    /// Defaults with zero floors and an instant schedule.
    pub fn instant() -> Self {
        Self::default()
            .with_lookup_floor(Duration::ZERO)
            .with_chat_floor(Duration::ZERO)
            .with_schedule(ScanSchedule::deep_scan().instant())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_web_max_results(mut self, max_results: u32) -> Self {
        self.web_max_results = Some(max_results);
        self
    }

    pub fn with_lookup_floor(mut self, floor: Duration) -> Self {
        self.lookup_floor = floor;
        self
    }

    pub fn with_chat_floor(mut self, floor: Duration) -> Self {
        self.chat_floor = floor;
        self
    }

    pub fn with_schedule(mut self, schedule: ScanSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// The plugin list attached to every request.
    pub fn plugins(&self) -> Vec<Plugin> {
        vec![Plugin::web_with(self.web_max_results, None)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reveal_floors() {
        let config = TraceConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.chat_model, CHAT_MODEL);
        assert_eq!(config.lookup_floor, Duration::from_secs(12));
        assert_eq!(config.chat_floor, Duration::from_secs(2));
        let last = config.schedule.steps().last().unwrap();
        assert!(last.offset < config.lookup_floor);
    }

    #[test]
    fn instant_zeroes_all_waits() {
        let config = TraceConfig::instant();
        assert!(config.lookup_floor.is_zero());
        assert!(config.chat_floor.is_zero());
        assert!(!config.schedule.steps().is_empty());
        assert!(config.schedule.steps().iter().all(|s| s.offset.is_zero()));
    }

    #[test]
    fn plugins_carry_web_cap() {
        let config = TraceConfig::default().with_web_max_results(3);
        let json = serde_json::to_value(config.plugins()).unwrap();
        assert_eq!(json[0]["id"], "web");
        assert_eq!(json[0]["max_results"], 3);
    }
}
