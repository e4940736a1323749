// Circuit breaker protecting the recognition transport
//
// When the recognition service is down, every bubble in a batch would
// otherwise wait out its full timeout. The breaker trips after a streak of
// failures so remaining tasks fail fast, then probes the service again after
// a cooldown.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests pass through normally
    Closed,
    /// Requests are rejected without touching the network
    Open,
    /// Cooldown elapsed; letting probe requests through
    Probing,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker
    pub trip_after: usize,
    /// How long to reject requests before probing again
    pub cooldown: Duration,
    /// Consecutive probe successes that close the breaker
    pub close_after: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            trip_after: 5,
            cooldown: Duration::from_secs(30),
            close_after: 2,
        }
    }
}

struct Shared {
    state: BreakerState,
    failure_streak: usize,
    probe_successes: usize,
    tripped_at: Option<Instant>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Mutex<Shared>>,
    config: BreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: BreakerState::Closed,
                failure_streak: 0,
                probe_successes: 0,
                tripped_at: None,
            })),
            config,
        }
    }

    /// Whether a request may proceed. Transitions Open -> Probing once the
    /// cooldown has elapsed.
    pub fn allow(&self) -> bool {
        let mut shared = self.shared.lock();
        match shared.state {
            BreakerState::Closed | BreakerState::Probing => true,
            BreakerState::Open => {
                let cooled_down = shared
                    .tripped_at
                    .is_some_and(|t| t.elapsed() >= self.config.cooldown);
                if cooled_down {
                    shared.state = BreakerState::Probing;
                    shared.probe_successes = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut shared = self.shared.lock();
        shared.failure_streak = 0;
        if shared.state == BreakerState::Probing {
            shared.probe_successes += 1;
            if shared.probe_successes >= self.config.close_after {
                shared.state = BreakerState::Closed;
            }
        }
    }

    pub fn on_failure(&self) {
        let mut shared = self.shared.lock();
        shared.probe_successes = 0;
        shared.tripped_at = Some(Instant::now());
        match shared.state {
            BreakerState::Closed => {
                shared.failure_streak += 1;
                if shared.failure_streak >= self.config.trip_after {
                    shared.state = BreakerState::Open;
                }
            }
            // A failed probe reopens immediately
            BreakerState::Probing => {
                shared.state = BreakerState::Open;
                shared.failure_streak = 1;
            }
            BreakerState::Open => {
                shared.failure_streak += 1;
            }
        }
    }

    pub fn state(&self) -> BreakerState {
        self.shared.lock().state
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
