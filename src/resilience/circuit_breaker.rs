//! Circuit breaker for route protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: instances assumed down, requests go straight to the fallback
//! - Half-Open: testing if the service recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: first request after cooldown
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails
//! ```
//!
//! # Design Decisions
//! - Per-route circuit breaker (not global)
//! - Fail fast in Open state: no health probes, no upstream call
//! - At most `half_open_max_calls` trials in flight while Half-Open
//! - A permit dropped without an outcome (client went away) frees its
//!   trial slot and records nothing
//! - Every transition starts a new generation; outcomes from permits of an
//!   earlier generation are ignored

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    generation: u64,
}

/// Point-in-time view for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    cooldown: Duration,
    half_open_max_calls: u32,
    failure_status_codes: Vec<u16>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            failure_threshold: config.failure_threshold.max(1),
            cooldown: Duration::from_millis(config.cooldown_ms),
            half_open_max_calls: config.half_open_max_calls.max(1),
            failure_status_codes: config.failure_status_codes.clone(),
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_in_flight: 0,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // Every update leaves the counters consistent, so a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state. An expired Open state still reads Open until a request
    /// arrives to move it to Half-Open.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            failure_threshold: self.failure_threshold,
        }
    }

    /// Whether an upstream status should count against the breaker.
    pub fn is_failure_status(&self, status: u16) -> bool {
        self.failure_status_codes.contains(&status)
    }

    /// Ask to let a request through. `None` means the circuit is open.
    pub fn try_acquire(self: &Arc<Self>) -> Option<CallPermit> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if !cooled_down {
                    return None;
                }
                self.transition(&mut inner, CircuitState::HalfOpen);
                inner.half_open_in_flight = 1;
            }
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight >= self.half_open_max_calls {
                    return None;
                }
                inner.half_open_in_flight += 1;
            }
        }

        Some(CallPermit {
            breaker: Arc::clone(self),
            generation: inner.generation,
            recorded: false,
        })
    }

    fn record_success(&self, generation: u64) {
        let mut inner = self.lock();
        if generation != inner.generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self, generation: u64) {
        let mut inner = self.lock();
        if generation != inner.generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.opened_at = Some(Instant::now());
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                inner.consecutive_failures += 1;
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if generation == inner.generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.half_open_in_flight = 0;
        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %from,
                failures = inner.consecutive_failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit opened"
            ),
            _ => tracing::info!(breaker = %self.name, from = %from, to = %to, "Circuit state changed"),
        }
        metrics::record_breaker_state(&self.name, to);
    }
}

/// Admission ticket for one request. Report the outcome with
/// [`CallPermit::success`] or [`CallPermit::failure`].
#[derive(Debug)]
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    recorded: bool,
}

impl CallPermit {
    pub fn success(mut self) {
        self.recorded = true;
        self.breaker.record_success(self.generation);
    }

    pub fn failure(mut self) {
        self.recorded = true;
        self.breaker.record_failure(self.generation);
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.recorded {
            self.breaker.release(self.generation);
        }
    }
}
