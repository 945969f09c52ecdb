//! Flow-rate estimation and per-key throttling.
//!
//! `NaiveFlowRate` keeps exact timestamps, `SmoothFlowRate` approximates a
//! sliding window from two fixed buckets. `Throttle` applies either one per key
//! (e-mail address, phone number) with a fixed limit.

mod flow;

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

pub use flow::{FlowRate, NaiveFlowRate, SmoothFlowRate};

/// Outcome of asking the throttle about one more event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ThrottleDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Throttle<K, F = SmoothFlowRate> {
    limit: u32,
    window: Duration,
    flows: HashMap<K, F>,
}

impl<K, F> Throttle<K, F>
where
    K: Eq + Hash,
    F: FlowRate,
{
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            flows: HashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Decide without recording anything.
    pub fn check(&mut self, key: &K, now: DateTime<Utc>) -> ThrottleDecision {
        match self.flows.get_mut(key) {
            Some(flow) => decide(flow, self.limit, now),
            None => decide(&mut F::with_window(self.window), self.limit, now),
        }
    }

    /// Record an event for `key` if it is allowed.
    pub fn hit(&mut self, key: K, now: DateTime<Utc>) -> ThrottleDecision {
        let limit = self.limit;
        let window = self.window;
        let flow = self
            .flows
            .entry(key)
            .or_insert_with(|| F::with_window(window));

        match decide(flow, limit, now) {
            ThrottleDecision::Allowed { remaining } => {
                flow.record(now);
                ThrottleDecision::Allowed { remaining }
            }
            limited => limited,
        }
    }

    pub fn reset(&mut self, key: &K) {
        self.flows.remove(key);
    }

    /// Drop keys whose window no longer holds any events.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.flows.retain(|_, flow| flow.estimate(now) > 0.0);
    }

    pub fn tracked_keys(&self) -> usize {
        self.flows.len()
    }
}

fn decide<F: FlowRate>(flow: &mut F, limit: u32, now: DateTime<Utc>) -> ThrottleDecision {
    let estimate = flow.estimate(now);
    if estimate + 1.0 <= limit as f64 {
        let remaining = (limit as f64 - estimate - 1.0).floor().max(0.0) as u32;
        ThrottleDecision::Allowed { remaining }
    } else {
        ThrottleDecision::Limited {
            retry_after: flow.retry_after(limit, now),
        }
    }
}
