//! Shared types used across the warmer crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Invocation number of the receiving instance within its fan-out.
pub const INVOCATION_KEY: &str = "__WARMER_INVOCATION__";
/// Concurrency originally requested at the root of the fan-out.
pub const CONCURRENCY_KEY: &str = "__WARMER_CONCURRENCY__";
/// Correlation id shared by every instance in one fan-out tree.
pub const CORRELATION_ID_KEY: &str = "__WARMER_CORRELATIONID__";
/// Tells the receiving instance to hold its slot for the configured delay.
pub const DELAY_KEY: &str = "__WARMER_DELAY__";

/// Version alias of the unpublished function code.
pub const LATEST_VERSION: &str = "$LATEST";

/// Reference to a function, as accepted by the invoke API: a bare name,
/// `name:qualifier`, or a full ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionRef(String);

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of the running function, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfFunction {
    pub name: String,
    pub version: String,
}

impl SelfFunction {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Read `AWS_LAMBDA_FUNCTION_NAME` / `AWS_LAMBDA_FUNCTION_VERSION`.
    ///
    /// A missing version means the unpublished `$LATEST` code.
    pub fn from_env() -> Self {
        let name = std::env::var("AWS_LAMBDA_FUNCTION_NAME").unwrap_or_default();
        let version = std::env::var("AWS_LAMBDA_FUNCTION_VERSION")
            .unwrap_or_else(|_| LATEST_VERSION.to_string());
        Self { name, version }
    }

    /// `name:version`, the reference used when an event names no target.
    pub fn qualified(&self) -> FunctionRef {
        FunctionRef(format!("{}:{}", self.name, self.version))
    }

    /// Whether `target` refers to this exact running function.
    ///
    /// An unqualified name matches only when this instance runs `$LATEST`.
    pub fn is_self(&self, target: &FunctionRef) -> bool {
        target == &self.qualified()
            || (target.as_str() == self.name && self.version == LATEST_VERSION)
    }
}

/// A parsed warming ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmSignal {
    /// Number of instances the pool should hold, at least 1.
    pub concurrency: u32,
    /// Position of the receiving instance in the fan-out, at least 1.
    pub invocation_index: u32,
    /// Concurrency requested at the root of the fan-out.
    pub invocation_total: u32,
    pub correlation_id: String,
    /// Function to warm. `None` means self.
    pub target: Option<FunctionRef>,
    pub explicit_delay_requested: bool,
    /// Set when the test field is truthy: no fan-out regardless of concurrency.
    pub fan_out_disabled: bool,
}

/// How the invoker should run a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationType {
    /// Fire-and-forget.
    Event,
    /// Wait for the invoked function to finish.
    RequestResponse,
}

impl InvocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationType::Event => "Event",
            InvocationType::RequestResponse => "RequestResponse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Event" => Some(InvocationType::Event),
            "RequestResponse" => Some(InvocationType::RequestResponse),
            _ => None,
        }
    }
}

impl fmt::Display for InvocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound warming invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub target: FunctionRef,
    pub invocation_type: InvocationType,
    pub payload: Value,
}

impl InvocationRequest {
    /// Build the self-describing payload for invocation `index` of `concurrency`.
    pub fn warming(
        target: FunctionRef,
        invocation_type: InvocationType,
        flag_field: &str,
        index: u32,
        concurrency: u32,
        correlation_id: &str,
        delay: bool,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert(flag_field.to_string(), Value::Bool(true));
        payload.insert(INVOCATION_KEY.to_string(), Value::from(index));
        payload.insert(CONCURRENCY_KEY.to_string(), Value::from(concurrency));
        payload.insert(
            CORRELATION_ID_KEY.to_string(),
            Value::String(correlation_id.to_string()),
        );
        payload.insert(DELAY_KEY.to_string(), Value::Bool(delay));

        Self {
            target,
            invocation_type,
            payload: Value::Object(payload),
        }
    }

    pub fn is_synchronous(&self) -> bool {
        self.invocation_type == InvocationType::RequestResponse
    }

    /// The invocation number stamped into the payload.
    pub fn invocation_index(&self) -> Option<u64> {
        self.payload.get(INVOCATION_KEY).and_then(Value::as_u64)
    }

    pub fn payload_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Invoke further instances, the last one synchronously.
    FanOut,
    /// Hold the execution slot for the configured delay.
    WaitAndReturn,
    /// Nothing to do.
    ImmediateReturn,
}

/// What one warming ping should do, derived from a signal and a config.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    pub mode: DispatchMode,
    /// Target the ping resolved to, self when the event named none.
    pub target: FunctionRef,
    pub invocations: Vec<InvocationRequest>,
}

/// The observability record emitted for each warming ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmerLog {
    pub action: String,
    pub function: String,
    pub id: String,
    pub correlation_id: String,
    pub count: u32,
    pub concurrency: u32,
    /// Warm state before this ping.
    pub warm: bool,
    /// Epoch milliseconds of the previous access.
    pub last_accessed: Option<u64>,
    /// Seconds since the previous access, one decimal.
    pub last_accessed_seconds: Option<f64>,
}
