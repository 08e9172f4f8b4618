//! Fan-out planning.
//!
//! Pure: turns one warming signal into a [`DispatchPlan`] without touching
//! state or the network.
//!
//! When warming self, this instance already counts as invocation 1, so
//! the plan covers `2..=concurrency`. When warming another function, this
//! instance is not part of that pool and the plan covers
//! `1..=concurrency`, with every payload told to hold its slot. The last
//! invocation is always `RequestResponse` so the caller blocks until the
//! whole set has been accepted.

use warmer_core::{
    DispatchConfig, DispatchMode, DispatchPlan, InvocationRequest, InvocationType,
    SelfFunction, WarmSignal,
};

pub fn plan(signal: &WarmSignal, config: &DispatchConfig, me: &SelfFunction) -> DispatchPlan {
    let target = signal.target.clone().unwrap_or_else(|| me.qualified());
    let different_target = !me.is_self(&target);

    let should_fan_out =
        (signal.concurrency > 1 || different_target) && !signal.fan_out_disabled;

    if should_fan_out {
        let first = if different_target { 1 } else { 2 };
        let invocations = (first..=signal.concurrency)
            .map(|i| {
                let invocation_type = if i == signal.concurrency {
                    InvocationType::RequestResponse
                } else {
                    InvocationType::Event
                };
                InvocationRequest::warming(
                    target.clone(),
                    invocation_type,
                    &config.flag_field,
                    i,
                    signal.concurrency,
                    &signal.correlation_id,
                    different_target,
                )
            })
            .collect();

        return DispatchPlan {
            mode: DispatchMode::FanOut,
            target,
            invocations,
        };
    }

    let mode = if signal.explicit_delay_requested || signal.invocation_index > 1 {
        DispatchMode::WaitAndReturn
    } else {
        DispatchMode::ImmediateReturn
    };

    DispatchPlan {
        mode,
        target,
        invocations: Vec::new(),
    }
}
