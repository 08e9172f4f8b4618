//! warmer — keep a pool of function instances initialized.
//!
//! A warming ping is an ordinary invocation whose payload carries a flag.
//! The instance that receives it decides, from the payload alone, how many
//! more instances to start and stamps each outbound payload with its
//! position in the fan-out. No instance needs shared state to know its
//! place in the tree.
//!
//! # Flow
//!
//! ```text
//! Warmer::handle(value)
//!   │
//!   ├── array? → each element in order (batch), OR of results
//!   │
//!   ▼
//! classify(event)  ── not a ping ──▶ mark warm, return false
//!   │
//!   ▼
//! plan(signal)
//!   ├── FanOut          invoke i = (self ? 2 : 1)..=concurrency,
//!   │                   last one RequestResponse, all awaited together
//!   ├── WaitAndReturn   sleep `delay`, hold the execution slot
//!   └── ImmediateReturn
//!   │
//!   ▼
//! true
//! ```
//!
//! Per-process state ([`InstanceState`]) lives inside the [`Warmer`]
//! service object, which is expected to be created once per process and
//! reused for every invocation.

pub mod batch;
pub mod classifier;
pub mod plan;
pub mod state;
pub mod service;

pub use classifier::{Classification, classify};
pub use plan::plan;
pub use state::{InstanceIdentity, InstanceState};
pub use service::{EventOutcome, Warmer};
