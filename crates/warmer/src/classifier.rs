//! Warming-ping detection.
//!
//! Classification never fails: missing or malformed fields fall back to
//! their defaults.

use warmer_core::{
    CONCURRENCY_KEY, CORRELATION_ID_KEY, DELAY_KEY, DispatchConfig, Event, FunctionRef,
    INVOCATION_KEY, WarmSignal,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Real workload.
    NotWarming,
    Warming(WarmSignal),
}

impl Classification {
    pub fn is_warming(&self) -> bool {
        matches!(self, Classification::Warming(_))
    }
}

/// Classify `event` under `config`.
///
/// `fallback_correlation_id` is used when neither the event nor the config
/// carries a correlation id; callers pass the instance id so the root of a
/// fan-out tree names it.
pub fn classify(
    event: &Event,
    config: &DispatchConfig,
    fallback_correlation_id: &str,
) -> Classification {
    if !event.is_truthy(&config.flag_field) {
        return Classification::NotWarming;
    }

    let concurrency = event
        .count(&config.concurrency_field)
        .filter(|n| *n > 1 && *n <= config.max_concurrency)
        .unwrap_or(1);

    let correlation_id = event
        .string(CORRELATION_ID_KEY)
        .or_else(|| config.default_correlation_id.clone())
        .unwrap_or_else(|| fallback_correlation_id.to_string());

    Classification::Warming(WarmSignal {
        concurrency,
        invocation_index: event.count(INVOCATION_KEY).unwrap_or(1),
        invocation_total: event.count(CONCURRENCY_KEY).unwrap_or(concurrency),
        correlation_id,
        target: event.string(&config.target_field).map(FunctionRef::new),
        explicit_delay_requested: event.is_truthy(DELAY_KEY),
        fan_out_disabled: event.is_truthy(&config.test_field),
    })
}
