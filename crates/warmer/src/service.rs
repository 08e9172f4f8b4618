//! The long-lived warmer service.
//!
//! `Warmer` owns the per-process identity and state and executes dispatch
//! plans against a [`RemoteInvoker`]. Create one per process and route
//! every invocation through it.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use warmer_core::{
    DispatchConfig, DispatchMode, DispatchPlan, Event, SelfFunction, WarmerLog,
};
use warmer_invoke::{InvokeResult, RemoteInvoker};

use crate::classifier::{Classification, classify};
use crate::plan::plan;
use crate::state::{InstanceIdentity, InstanceState};

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    /// Whether the event was a warming ping.
    pub warming: bool,
    /// `None` for non-warming events.
    pub mode: Option<DispatchMode>,
    /// The observability record, built whether or not it was emitted.
    pub log: Option<WarmerLog>,
}

pub struct Warmer {
    identity: InstanceIdentity,
    state: Mutex<InstanceState>,
    function: SelfFunction,
    config: DispatchConfig,
    invoker: Arc<dyn RemoteInvoker>,
}

impl std::fmt::Debug for Warmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warmer")
            .field("identity", &self.identity)
            .field("function", &self.function)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Warmer {
    /// A cold warmer with a fresh identity and the default config.
    pub fn new(function: SelfFunction, invoker: Arc<dyn RemoteInvoker>) -> Self {
        Self {
            identity: InstanceIdentity::generate(),
            state: Mutex::new(InstanceState::cold()),
            function,
            config: DispatchConfig::default(),
            invoker,
        }
    }

    /// Config used by [`Warmer::handle`].
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_identity(mut self, identity: InstanceIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn id(&self) -> &str {
        self.identity.id()
    }

    pub fn function(&self) -> &SelfFunction {
        &self.function
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Snapshot of the instance state.
    pub fn state(&self) -> InstanceState {
        *self.lock_state()
    }

    /// Process one event. Returns whether it was a warming ping.
    pub async fn handle_event(&self, event: &Event, config: &DispatchConfig) -> InvokeResult<bool> {
        Ok(self.dispatch(event, config).await?.warming)
    }

    /// Process one event and report what was done.
    ///
    /// Invoker failures are returned unchanged; there is no retry.
    pub async fn dispatch(
        &self,
        event: &Event,
        config: &DispatchConfig,
    ) -> InvokeResult<EventOutcome> {
        let signal = match classify(event, config, self.identity.id()) {
            Classification::Warming(signal) => signal,
            Classification::NotWarming => {
                self.touch(SystemTime::now());
                return Ok(EventOutcome {
                    warming: false,
                    mode: None,
                    log: None,
                });
            }
        };

        let plan = plan(&signal, config, &self.function);

        let now = SystemTime::now();
        let previous = self.touch(now);
        let log = WarmerLog {
            action: "warmer".to_string(),
            function: plan.target.to_string(),
            id: self.identity.id().to_string(),
            correlation_id: signal.correlation_id.clone(),
            count: signal.invocation_index,
            concurrency: signal.invocation_total,
            warm: previous.warm,
            last_accessed: previous.last_accessed_millis(),
            last_accessed_seconds: previous.seconds_since_access(now),
        };
        if config.logging_enabled {
            emit(&log);
        }

        self.execute(&plan, config).await?;

        Ok(EventOutcome {
            warming: true,
            mode: Some(plan.mode),
            log: Some(log),
        })
    }

    async fn execute(&self, plan: &DispatchPlan, config: &DispatchConfig) -> InvokeResult<()> {
        match plan.mode {
            DispatchMode::FanOut => {
                // Issue every request before awaiting any of them.
                let pending = plan.invocations.iter().map(|req| {
                    debug!(
                        function = %req.target,
                        invocation_type = %req.invocation_type,
                        index = ?req.invocation_index(),
                        "dispatching warming invocation"
                    );
                    self.invoker.invoke(req)
                });
                let results = join_all(pending).await;

                for (req, result) in plan.invocations.iter().zip(results) {
                    if let Err(e) = result {
                        warn!(
                            function = %req.target,
                            index = ?req.invocation_index(),
                            error = %e,
                            "warming invocation failed"
                        );
                        return Err(e);
                    }
                }
                debug!(
                    function = %plan.target,
                    invocations = plan.invocations.len(),
                    "fan-out complete"
                );
            }
            DispatchMode::WaitAndReturn => {
                debug!(delay_ms = config.delay_ms, "holding warm instance");
                tokio::time::sleep(config.delay()).await;
            }
            DispatchMode::ImmediateReturn => {}
        }
        Ok(())
    }

    fn touch(&self, now: SystemTime) -> InstanceState {
        self.lock_state().touch(now)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InstanceState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Emit the record as one camelCase JSON object under the `record` field.
fn emit(log: &WarmerLog) {
    match serde_json::to_string(log) {
        Ok(record) => info!(target: "warmer", %record, "warmer"),
        Err(e) => warn!(target: "warmer", error = %e, "failed to encode warmer record"),
    }
}
