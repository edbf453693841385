//! Correlation ids and cost tracking.
//!
//! Every lookup gets a `trace_id` that prefixes its log lines; every chat
//! message gets a process-unique id. Token usage from both kinds of call is
//! folded into one [`CostTracker`] per front-end session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ts:x}-{count:04x}")
}

/// Generate a unique trace id for a lookup.
pub fn generate_trace_id() -> String {
    format!("nt-{}", unique_suffix())
}

/// Generate a unique chat message id.
pub fn generate_message_id() -> String {
    format!("msg-{}", unique_suffix())
}

/// Per-model pricing for cost estimation (USD per 1M tokens).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn estimate_cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (completion_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input_per_million: 1.25,
            output_per_million: 10.0,
        }
    }
}

/// Approximate pricing for a model, matched on the segment after the last `/`.
///
/// Web-search plugin fees are not included.
pub fn pricing_for_model(model: &str) -> ModelPricing {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();

    if name.contains("flash-lite") {
        ModelPricing {
            input_per_million: 0.10,
            output_per_million: 0.40,
        }
    } else if name.contains("flash") {
        ModelPricing {
            input_per_million: 0.30,
            output_per_million: 2.50,
        }
    } else if name.contains("gemini-3") {
        ModelPricing {
            input_per_million: 2.0,
            output_per_million: 12.0,
        }
    } else if name.contains("gemini") {
        ModelPricing {
            input_per_million: 1.25,
            output_per_million: 10.0,
        }
    } else {
        ModelPricing::default()
    }
}

/// Cumulative usage across lookups and chat turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostTracker {
    pub calls: u32,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub estimated_cost_usd: f64,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage for one call.
    pub fn record(&mut self, prompt_tokens: u32, completion_tokens: u32, pricing: &ModelPricing) {
        self.calls += 1;
        self.total_prompt_tokens += prompt_tokens as u64;
        self.total_completion_tokens += completion_tokens as u64;
        self.estimated_cost_usd += pricing.estimate_cost(prompt_tokens, completion_tokens);
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_prompt_tokens + self.total_completion_tokens
    }

    /// Format as a short summary string.
    pub fn summary(&self) -> String {
        format!(
            "calls: {}, tokens: {} prompt + {} completion = {} total, est. cost: ${:.4}",
            self.calls,
            self.total_prompt_tokens,
            self.total_completion_tokens,
            self.total_tokens(),
            self.estimated_cost_usd,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = generate_trace_id();
        let b = generate_trace_id();
        assert_ne!(a, b);
        assert!(a.starts_with("nt-"));
        assert!(generate_message_id().starts_with("msg-"));
    }

    #[test]
    fn cost_estimation() {
        let pricing = ModelPricing {
            input_per_million: 2.0,
            output_per_million: 12.0,
        };
        let cost = pricing.estimate_cost(1_000_000, 100_000);
        assert!((cost - 3.2).abs() < 0.001);
    }

    #[test]
    fn pricing_lookup_known_models() {
        let pro = pricing_for_model(crate::DEFAULT_MODEL);
        let flash = pricing_for_model(crate::CHAT_MODEL);
        assert!(flash.input_per_million < pro.input_per_million);
        assert_eq!(pricing_for_model("other/model"), ModelPricing::default());
    }

    #[test]
    fn cost_tracker_accumulates() {
        let mut tracker = CostTracker::new();
        let pricing = ModelPricing::default();
        tracker.record(1000, 500, &pricing);
        tracker.record(2000, 1000, &pricing);
        assert_eq!(tracker.calls, 2);
        assert_eq!(tracker.total_tokens(), 4500);
        assert!(tracker.estimated_cost_usd > 0.0);
        assert!(tracker.summary().contains("calls: 2"));
    }
}
