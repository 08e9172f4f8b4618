//! Entry point accepting one event or a batch.
//!
//! A batch is processed strictly in order: each element's dispatch,
//! including any delay, completes before the next one starts. The result
//! is true if any element was a warming ping.

use serde_json::Value;
use tracing::debug;

use warmer_core::{DispatchConfig, Event};
use warmer_invoke::InvokeResult;

use crate::service::Warmer;

impl Warmer {
    /// Handle an event or a batch of events with the warmer's own config.
    pub async fn handle(&self, input: &Value) -> InvokeResult<bool> {
        let config = self.config().clone();
        self.handle_with(input, &config).await
    }

    /// Handle an event or a batch of events with an explicit config.
    pub async fn handle_with(&self, input: &Value, config: &DispatchConfig) -> InvokeResult<bool> {
        match input {
            Value::Array(events) => self.handle_batch(events, config).await,
            single => self.handle_event(&Event::new(single.clone()), config).await,
        }
    }

    async fn handle_batch(&self, events: &[Value], config: &DispatchConfig) -> InvokeResult<bool> {
        let mut any_warming = false;
        for (position, value) in events.iter().enumerate() {
            let warming = self.handle_event(&Event::new(value.clone()), config).await?;
            debug!(position, warming, "batch element processed");
            any_warming |= warming;
        }
        Ok(any_warming)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use warmer_core::{DELAY_KEY, INVOCATION_KEY, InvocationType, SelfFunction};
    use warmer_invoke::{InvokeError, RecordingInvoker};

    use super::*;

    fn warmer() -> (Warmer, Arc<RecordingInvoker>) {
        let invoker = Arc::new(RecordingInvoker::new());
        let warmer = Warmer::new(SelfFunction::new("f", "$LATEST"), invoker.clone())
            .with_config(DispatchConfig::default().with_logging(false));
        (warmer, invoker)
    }

    #[tokio::test]
    async fn single_object_is_one_event() {
        let (w, _) = warmer();
        assert!(w.handle(&json!({ "warmer": true })).await.unwrap());
        assert!(!w.handle(&json!({ "other": true })).await.unwrap());
    }

    #[tokio::test]
    async fn non_object_input_is_not_warming_but_warms_instance() {
        let (w, invoker) = warmer();
        assert!(!w.handle(&json!("hello")).await.unwrap());
        assert!(w.state().warm);
        assert_eq!(invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_batch_is_false() {
        let (w, _) = warmer();
        assert!(!w.handle(&json!([])).await.unwrap());
    }

    #[tokio::test]
    async fn batch_of_self_pings_with_concurrency_one_does_nothing() {
        let (w, invoker) = warmer();
        let out = w
            .handle(&json!([
                { "warmer": true, "concurrency": 1 },
                { "warmer": true, "concurrency": 1 },
            ]))
            .await
            .unwrap();
        assert!(out);
        assert_eq!(invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn heterogeneous_targets_in_input_order() {
        let (w, invoker) = warmer();
        let out = w
            .handle(&json!([
                { "warmer": true, "concurrency": 2, "target": "a" },
                { "warmer": true, "concurrency": 3 },
                { "warmer": true, "concurrency": 1, "target": "b:prod" },
            ]))
            .await
            .unwrap();
        assert!(out);

        let calls = invoker.calls();
        let summary: Vec<(&str, u64, InvocationType)> = calls
            .iter()
            .map(|c| {
                (
                    c.target.as_str(),
                    c.payload[INVOCATION_KEY].as_u64().unwrap(),
                    c.invocation_type,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", 1, InvocationType::Event),
                ("a", 2, InvocationType::RequestResponse),
                ("f:$LATEST", 2, InvocationType::Event),
                ("f:$LATEST", 3, InvocationType::RequestResponse),
                ("b:prod", 1, InvocationType::RequestResponse),
            ]
        );
        assert_eq!(calls[0].payload[DELAY_KEY], true);
        assert_eq!(calls[2].payload[DELAY_KEY], false);
    }

    #[tokio::test]
    async fn mixed_batch_is_true_if_any_element_warms() {
        let (w, _) = warmer();
        assert!(
            w.handle(&json!([{ "body": 1 }, { "warmer": true }, { "body": 2 }]))
                .await
                .unwrap()
        );
        assert!(
            !w.handle(&json!([{ "body": 1 }, { "body": 2 }]))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn batch_stops_at_first_failure() {
        let (w, invoker) = warmer();
        invoker.fail_with(InvokeError::Other("denied".to_string()));

        let err = w
            .handle(&json!([
                { "warmer": true, "target": "a" },
                { "warmer": true, "target": "b" },
            ]))
            .await
            .unwrap_err();
        assert_eq!(err, InvokeError::Other("denied".to_string()));
        assert_eq!(invoker.call_count(), 1);
    }

    #[tokio::test]
    async fn explicit_config_overrides_own_config() {
        let (w, invoker) = warmer();
        let config = DispatchConfig {
            flag_field: "ping".to_string(),
            logging_enabled: false,
            ..DispatchConfig::default()
        };
        assert!(
            w.handle_with(&json!({ "ping": true, "concurrency": 2 }), &config)
                .await
                .unwrap()
        );
        assert_eq!(invoker.calls()[0].payload["ping"], true);
    }
}
