//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast
//! - Half-Open: testing if upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: after break duration
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails
//! ```
//!
//! # Design Decisions
//! - One breaker per named outbound channel, shared by every call through it
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial in Half-Open (prevents hammering recovering upstream)
//! - State lives behind one mutex that is never held across an await

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Inner {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    HalfOpen { trial_in_flight: bool },
}

/// Returned when the breaker refuses a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected {
    /// Time left in the open window; zero while a trial is in flight.
    pub retry_after: Duration,
}

/// A circuit breaker guarding one outbound channel.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    break_duration: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker from configuration.
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        Self::with_settings(
            name,
            config.failure_threshold,
            Duration::from_secs(config.break_duration_secs),
        )
    }

    pub fn with_settings(
        name: impl Into<String>,
        failure_threshold: u32,
        break_duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            break_duration,
            inner: Mutex::new(Inner::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An open breaker whose window has elapsed reports
    /// Half-Open, since the next call will be admitted as a trial.
    pub fn state(&self) -> CircuitState {
        let current = *self.lock();
        match current {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { until } if Instant::now() >= until => CircuitState::HalfOpen,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Consecutive failures counted while closed.
    pub fn consecutive_failures(&self) -> u32 {
        let current = *self.lock();
        match current {
            Inner::Closed {
                consecutive_failures,
            } => consecutive_failures,
            _ => self.failure_threshold,
        }
    }

    /// Ask to make a call. The returned permit must be resolved with
    /// [`Permit::success`] or [`Permit::failure`]; dropping it unresolved
    /// releases a Half-Open trial slot without changing state.
    pub fn try_acquire(&self) -> Result<Permit<'_>, Rejected> {
        let mut inner = self.lock();
        let current = *inner;
        match current {
            Inner::Closed { .. } => Ok(Permit::new(self, false)),
            Inner::Open { until } => {
                let now = Instant::now();
                if now >= until {
                    *inner = Inner::HalfOpen {
                        trial_in_flight: true,
                    };
                    drop(inner);
                    tracing::info!(channel = %self.name, "Circuit half-open, admitting trial call");
                    metrics::record_circuit_state(&self.name, CircuitState::HalfOpen);
                    Ok(Permit::new(self, true))
                } else {
                    Err(Rejected {
                        retry_after: until - now,
                    })
                }
            }
            Inner::HalfOpen {
                trial_in_flight: true,
            } => Err(Rejected {
                retry_after: Duration::ZERO,
            }),
            Inner::HalfOpen {
                trial_in_flight: false,
            } => {
                *inner = Inner::HalfOpen {
                    trial_in_flight: true,
                };
                Ok(Permit::new(self, true))
            }
        }
    }

    /// Force the breaker back to Closed.
    pub fn reset(&self) {
        *self.lock() = Inner::Closed {
            consecutive_failures: 0,
        };
        metrics::record_circuit_state(&self.name, CircuitState::Closed);
    }

    /// Count an attempt whose permit was dropped because the caller's
    /// deadline elapsed mid-call.
    pub(crate) fn record_cut_off(&self, trial: bool) {
        self.on_failure(trial);
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.lock();
        let current = *inner;
        match current {
            Inner::Closed { .. } => {
                *inner = Inner::Closed {
                    consecutive_failures: 0,
                };
            }
            Inner::HalfOpen { .. } if trial => {
                *inner = Inner::Closed {
                    consecutive_failures: 0,
                };
                drop(inner);
                tracing::info!(channel = %self.name, "Trial call succeeded, circuit closed");
                metrics::record_circuit_state(&self.name, CircuitState::Closed);
            }
            // Late result from a call admitted before the breaker tripped.
            _ => {}
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.lock();
        let current = *inner;
        match current {
            Inner::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.failure_threshold {
                    *inner = Inner::Open {
                        until: Instant::now() + self.break_duration,
                    };
                    drop(inner);
                    tracing::warn!(
                        channel = %self.name,
                        failures,
                        break_secs = self.break_duration.as_secs(),
                        "Circuit opened"
                    );
                    metrics::record_circuit_opened(&self.name);
                    metrics::record_circuit_state(&self.name, CircuitState::Open);
                } else {
                    *inner = Inner::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            Inner::HalfOpen { .. } if trial => {
                *inner = Inner::Open {
                    until: Instant::now() + self.break_duration,
                };
                drop(inner);
                tracing::warn!(channel = %self.name, "Trial call failed, circuit re-opened");
                metrics::record_circuit_opened(&self.name);
                metrics::record_circuit_state(&self.name, CircuitState::Open);
            }
            _ => {}
        }
    }

    fn on_abandon(&self, trial: bool) {
        if !trial {
            return;
        }
        let mut inner = self.lock();
        let current = *inner;
        if let Inner::HalfOpen {
            trial_in_flight: true,
        } = current
        {
            *inner = Inner::HalfOpen {
                trial_in_flight: false,
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("circuit breaker mutex poisoned")
    }
}

/// Admission ticket for one call through a breaker.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    resolved: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            resolved: false,
        }
    }

    /// Whether this call is the single Half-Open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.resolved = true;
        self.breaker.on_success(self.trial);
    }

    pub fn failure(mut self) {
        self.resolved = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.on_abandon(self.trial);
        }
    }
}

/// Process-wide set of breakers, one per outbound channel name.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: CircuitBreakerConfig,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// Breaker for `channel`, created on first use.
    pub fn channel(&self, channel: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(channel, &self.config)))
            .clone()
    }

    /// Name and state of every known breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, CircuitState)> {
        let mut states: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }
}
