//! warmer-core — shared data model for keep-warm fan-out.
//!
//! Everything in here is plain data: the untyped inbound [`Event`] with
//! its default-on-missing accessors, the per-call [`DispatchConfig`], the
//! parsed [`WarmSignal`] and the [`DispatchPlan`] derived from it. The
//! orchestration logic lives in the `warmer` crate and the transport in
//! `warmer-invoke`.

pub mod config;
pub mod event;
pub mod types;

pub use config::DispatchConfig;
pub use event::Event;
pub use types::*;
