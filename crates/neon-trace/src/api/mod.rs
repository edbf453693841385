//! Correlation ids and usage accounting for model calls.
//!
//! - [`tracing`] — lookup trace ids, chat message ids, per-model pricing and
//!   the cumulative [`CostTracker`] surfaced in the view snapshot.

pub mod tracing;

pub use tracing::{
    CostTracker, ModelPricing, generate_message_id, generate_trace_id, pricing_for_model,
};
