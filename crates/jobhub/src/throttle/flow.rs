use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

/// Rolling estimate of how many events happened in the trailing window.
pub trait FlowRate {
    fn with_window(window: Duration) -> Self;

    fn record(&mut self, now: DateTime<Utc>);

    /// Estimated number of events inside the window ending at `now`.
    fn estimate(&mut self, now: DateTime<Utc>) -> f64;

    /// How long until one more event would keep the estimate within `limit`.
    fn retry_after(&mut self, limit: u32, now: DateTime<Utc>) -> Duration;

    fn window(&self) -> Duration;
}

fn sanitize_window(window: Duration) -> Duration {
    if window <= Duration::zero() {
        Duration::milliseconds(1)
    } else {
        window
    }
}

/// Exact counter that keeps every timestamp inside the window.
#[derive(Debug, Clone)]
pub struct NaiveFlowRate {
    window: Duration,
    events: VecDeque<DateTime<Utc>>,
}

impl NaiveFlowRate {
    pub fn new(window: Duration) -> Self {
        Self {
            window: sanitize_window(window),
            events: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some(front) = self.events.front() {
            if *front <= cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn count(&mut self, now: DateTime<Utc>) -> usize {
        self.prune(now);
        self.events.len()
    }

    /// Events per second over the window.
    pub fn rate(&mut self, now: DateTime<Utc>) -> f64 {
        let count = self.count(now) as f64;
        count * 1000.0 / self.window.num_milliseconds() as f64
    }
}

impl FlowRate for NaiveFlowRate {
    fn with_window(window: Duration) -> Self {
        Self::new(window)
    }

    fn record(&mut self, now: DateTime<Utc>) {
        self.prune(now);
        self.events.push_back(now);
    }

    fn estimate(&mut self, now: DateTime<Utc>) -> f64 {
        self.count(now) as f64
    }

    fn retry_after(&mut self, limit: u32, now: DateTime<Utc>) -> Duration {
        let count = self.count(now);
        if limit == 0 {
            return self.window;
        }
        let limit = limit as usize;
        if count < limit {
            return Duration::zero();
        }

        // The event whose departure frees the first slot.
        match self.events.get(count - limit) {
            Some(oldest) => (*oldest + self.window - now).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    fn window(&self) -> Duration {
        self.window
    }
}

/// Sliding-window counter: the previous fixed window is weighted by how much
/// of it still overlaps the trailing window.
#[derive(Debug, Clone)]
pub struct SmoothFlowRate {
    window: Duration,
    window_start: Option<DateTime<Utc>>,
    current: u64,
    previous: u64,
}

impl SmoothFlowRate {
    pub fn new(window: Duration) -> Self {
        Self {
            window: sanitize_window(window),
            window_start: None,
            current: 0,
            previous: 0,
        }
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return;
        };

        let elapsed = (now - start).num_milliseconds();
        if elapsed < 0 {
            return;
        }

        let window_ms = self.window.num_milliseconds();
        let passed = elapsed / window_ms;
        if passed == 1 {
            self.previous = self.current;
            self.current = 0;
        } else if passed > 1 {
            self.previous = 0;
            self.current = 0;
        }
        if passed >= 1 {
            self.window_start = Some(start + Duration::milliseconds(window_ms * passed));
        }
    }

    fn elapsed_fraction(&self, now: DateTime<Utc>) -> f64 {
        match self.window_start {
            Some(start) => {
                let elapsed = (now - start).num_milliseconds() as f64;
                (elapsed / self.window.num_milliseconds() as f64).clamp(0.0, 1.0)
            }
            None => 0.0,
        }
    }

    /// Events counted in the current fixed window and the one before it.
    pub fn buckets(&mut self, now: DateTime<Utc>) -> (u64, u64) {
        self.roll(now);
        (self.current, self.previous)
    }

    pub fn is_idle(&mut self, now: DateTime<Utc>) -> bool {
        self.estimate(now) <= 0.0
    }
}

impl FlowRate for SmoothFlowRate {
    fn with_window(window: Duration) -> Self {
        Self::new(window)
    }

    fn record(&mut self, now: DateTime<Utc>) {
        self.roll(now);
        self.current += 1;
    }

    fn estimate(&mut self, now: DateTime<Utc>) -> f64 {
        self.roll(now);
        let weight = 1.0 - self.elapsed_fraction(now);
        self.current as f64 + self.previous as f64 * weight
    }

    fn retry_after(&mut self, limit: u32, now: DateTime<Utc>) -> Duration {
        if limit == 0 {
            return self.window;
        }
        let headroom = limit as f64 - 1.0;
        if self.estimate(now) <= headroom {
            return Duration::zero();
        }

        let window_ms = self.window.num_milliseconds() as f64;
        let fraction = self.elapsed_fraction(now);
        let current = self.current as f64;

        let wait_ms = if current <= headroom {
            // Only the decaying previous window is in the way.
            let needed = 1.0 - (headroom - current) / self.previous as f64;
            (needed - fraction) * window_ms
        } else {
            // Wait for the current window to close, then for it to decay.
            let needed = 1.0 - headroom / current;
            (1.0 - fraction) * window_ms + needed * window_ms
        };

        Duration::milliseconds(wait_ms.max(0.0).ceil() as i64)
    }

    fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid") + Duration::seconds(seconds)
    }

    #[test]
    fn naive_rate_counts_only_events_inside_window() {
        let mut flow = NaiveFlowRate::new(Duration::seconds(60));
        flow.record(at(0));
        flow.record(at(10));
        flow.record(at(50));

        assert_eq!(flow.count(at(55)), 3);
        assert_eq!(flow.count(at(60)), 2, "event at t=0 leaves at t=60");
        assert_eq!(flow.count(at(111)), 0);
        assert!((flow.rate(at(30)) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn naive_rate_reports_per_second_rate() {
        let mut flow = NaiveFlowRate::new(Duration::seconds(10));
        for second in 0..5 {
            flow.record(at(second));
        }
        assert!((flow.rate(at(5)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn naive_retry_after_waits_for_oldest_blocking_event() {
        let mut flow = NaiveFlowRate::new(Duration::seconds(60));
        flow.record(at(0));
        flow.record(at(20));
        flow.record(at(30));

        assert_eq!(flow.retry_after(3, at(40)), Duration::seconds(20));
        assert_eq!(flow.retry_after(2, at(40)), Duration::seconds(40));
        assert_eq!(flow.retry_after(4, at(40)), Duration::zero());
    }

    #[test]
    fn smooth_rate_weights_previous_window() {
        let mut flow = SmoothFlowRate::new(Duration::seconds(60));
        for _ in 0..10 {
            flow.record(at(0));
        }
        assert!((flow.estimate(at(30)) - 10.0).abs() < 1e-9);

        // Halfway through the next window half of the previous count remains.
        assert!((flow.estimate(at(90)) - 5.0).abs() < 1e-9);

        flow.record(at(90));
        assert!((flow.estimate(at(90)) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_rate_resets_after_idle_windows() {
        let mut flow = SmoothFlowRate::new(Duration::seconds(60));
        flow.record(at(0));
        flow.record(at(1));
        assert_eq!(flow.buckets(at(200)), (0, 0));
        assert!(flow.is_idle(at(200)));
    }

    #[test]
    fn smooth_retry_after_accounts_for_decay() {
        let mut flow = SmoothFlowRate::new(Duration::seconds(60));
        flow.record(at(0));
        flow.record(at(0));

        // Limit 2: current window full, wait for rollover then half decay.
        let wait = flow.retry_after(2, at(0));
        assert_eq!(wait, Duration::seconds(90));

        // After waiting, one more event fits.
        let later = at(0) + wait;
        assert!(flow.estimate(later) <= 1.0 + 1e-9);
        assert_eq!(flow.retry_after(2, later), Duration::zero());
    }

    #[test]
    fn zero_limit_never_frees_up() {
        let mut flow = SmoothFlowRate::new(Duration::seconds(30));
        assert_eq!(flow.retry_after(0, at(0)), Duration::seconds(30));
    }
}
