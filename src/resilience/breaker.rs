//! Circuit breaker
//!
//! Lock-free: state, failure count and the open timestamp are atomics, so
//! concurrent callers never block on each other or on I/O.
//!
//! ```text
//! Closed --(failures >= threshold)--> Open --(cool-down elapsed)--> HalfOpen
//!   ^                                  ^                               |
//!   |                                  +-------(trial call failed)-----+
//!   +---------------------(trial call succeeded)-----------------------+
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::external::DependencyError;

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const HALF_OPEN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    fn from_u8(v: u8) -> Self {
        match v {
            OPEN => BreakerState::Open,
            HALF_OPEN => BreakerState::HalfOpen,
            _ => BreakerState::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time spent open before a trial call is let through
    pub cooldown: Duration,
    /// Per-call timeout; expiry counts as a failure
    pub call_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Point-in-time view of one breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerState {
    pub dependency_name: String,
    pub consecutive_failures: u32,
    pub state: BreakerState,
    pub opened_at: Option<DateTime<Utc>>,
    pub threshold: u32,
}

/// Why the fallback path was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// Circuit open (or a trial call already in flight); dependency not called
    CircuitOpen,
    /// This call opened the circuit
    Tripped,
}

/// Result of a guarded call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// Dependency answered successfully
    Completed(T),
    /// Dependency answered with a business rejection. Counts as healthy.
    Rejected(String),
    /// Dependency failed while the circuit stayed closed
    Failed(DependencyError),
    /// Take the fallback path
    Degraded(DegradedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal,
    Trial,
}

/// Admission decision for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Call(Permit),
    /// This call reaches the threshold; counted as a failure, not attempted
    Trip,
    Reject,
}

pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    /// Unix millis of the last transition to Open
    opened_at_ms: AtomicI64,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: AtomicU8::new(CLOSED),
            consecutive_failures: AtomicU32::new(0),
            opened_at_ms: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn state(&self) -> BreakerState {
        BreakerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> CircuitBreakerState {
        let state = self.state();
        let opened_at = match state {
            BreakerState::Closed => None,
            _ => Utc
                .timestamp_millis_opt(self.opened_at_ms.load(Ordering::Acquire))
                .single(),
        };
        CircuitBreakerState {
            dependency_name: self.name.clone(),
            consecutive_failures: self.consecutive_failures(),
            state,
            opened_at,
            threshold: self.config.failure_threshold,
        }
    }

    /// Run `call` under the breaker with the configured timeout.
    ///
    /// The future is only polled when the breaker grants a permit. An open
    /// circuit never reaches the dependency, and neither does the call that
    /// would be the `failure_threshold`-th consecutive failure: it opens the
    /// circuit and degrades straight away.
    pub async fn call<T, F>(&self, call: F) -> CallOutcome<T>
    where
        F: Future<Output = Result<T, DependencyError>>,
    {
        let permit = match self.acquire() {
            Admission::Call(permit) => permit,
            Admission::Trip => return self.trip_closed(None),
            Admission::Reject => return CallOutcome::Degraded(DegradedReason::CircuitOpen),
        };

        // A dropped trial call must not leave the breaker stuck in HalfOpen
        let mut trial_guard = (permit == Permit::Trial).then(|| TrialGuard { breaker: self });

        let result = match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DependencyError::Timeout(self.config.call_timeout)),
        };

        if let Some(guard) = trial_guard.take() {
            std::mem::forget(guard);
        }

        match result {
            Ok(value) => {
                self.on_success();
                CallOutcome::Completed(value)
            }
            Err(DependencyError::Rejected(reason)) => {
                self.on_success();
                CallOutcome::Rejected(reason)
            }
            Err(err) => self.on_failure(permit, err),
        }
    }

    fn acquire(&self) -> Admission {
        match self.state.load(Ordering::Acquire) {
            CLOSED => {
                // A threshold of 1 still lets the first call through
                let failures = self.consecutive_failures.load(Ordering::Acquire);
                if failures > 0 && failures + 1 >= self.config.failure_threshold {
                    self.consecutive_failures.fetch_add(1, Ordering::AcqRel);
                    Admission::Trip
                } else {
                    Admission::Call(Permit::Normal)
                }
            }
            OPEN => {
                let opened = self.opened_at_ms.load(Ordering::Acquire);
                let cooldown_ms = self.config.cooldown.as_millis() as i64;
                if now_ms().saturating_sub(opened) < cooldown_ms {
                    return Admission::Reject;
                }
                // Exactly one caller wins the trial call
                match self.state.compare_exchange(
                    OPEN,
                    HALF_OPEN,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        info!(dependency = %self.name, "circuit half-open, letting one call through");
                        Admission::Call(Permit::Trial)
                    }
                    Err(_) => Admission::Reject,
                }
            }
            _ => Admission::Reject,
        }
    }

    fn on_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        let previous = self.state.swap(CLOSED, Ordering::AcqRel);
        if previous != CLOSED {
            info!(dependency = %self.name, "circuit closed");
        }
    }

    fn on_failure<T>(&self, permit: Permit, err: DependencyError) -> CallOutcome<T> {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;

        if permit == Permit::Trial {
            self.trip(HALF_OPEN);
            warn!(dependency = %self.name, error = %err, "trial call failed, circuit re-opened");
            return CallOutcome::Degraded(DegradedReason::Tripped);
        }

        if failures < self.config.failure_threshold {
            warn!(
                dependency = %self.name,
                failures,
                threshold = self.config.failure_threshold,
                error = %err,
                "dependency call failed"
            );
            return CallOutcome::Failed(err);
        }

        self.trip_closed(Some(err))
    }

    /// Open a closed circuit on behalf of the current call
    fn trip_closed<T>(&self, err: Option<DependencyError>) -> CallOutcome<T> {
        if !self.trip(CLOSED) {
            // A concurrent caller already opened it
            return CallOutcome::Degraded(DegradedReason::CircuitOpen);
        }
        let failures = self.consecutive_failures();
        match err {
            Some(err) => warn!(dependency = %self.name, failures, error = %err, "circuit opened"),
            None => warn!(
                dependency = %self.name,
                failures,
                "circuit opened at threshold, call not attempted"
            ),
        }
        CallOutcome::Degraded(DegradedReason::Tripped)
    }

    /// Move `from -> Open` with a fresh cool-down. Returns false when the
    /// state was not `from`.
    fn trip(&self, from: u8) -> bool {
        self.opened_at_ms.store(now_ms(), Ordering::Release);
        self.state
            .compare_exchange(from, OPEN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Re-opens the circuit if a trial call is cancelled before it resolves
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        self.breaker.trip(HALF_OPEN);
        warn!(dependency = %self.breaker.name, "trial call cancelled, circuit re-opened");
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
