//! Circuit breaker for outgoing service calls.
//!
//! Stops forwarding calls to a service that keeps failing, giving it a
//! cooldown instead of a stream of doomed requests.
//!
//! # State Machine
//!
//! ```text
//! CLOSED → OPEN       (consecutive failures >= failure_threshold)
//! OPEN → HALF_OPEN    (first call after break_duration elapsed)
//! HALF_OPEN → CLOSED  (trial call succeeds, failure count reset)
//! HALF_OPEN → OPEN    (trial call fails, break timer restarts)
//! ```
//!
//! # Configuration
//!
//! - `failure_threshold`: Consecutive failures that open the circuit (default: 4)
//! - `break_duration`: Time to stay open before a trial call (default: 3s)
//!
//! Any error returned by the guarded operation counts as a failure,
//! whatever its kind. Retry classification is narrower and lives in
//! `retry.rs`.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_client::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! let breaker = CircuitBreaker::new("orders", CircuitBreakerConfig::default());
//! let response = breaker.execute(|| transport.send(request)).await?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::InvocationError;
use crate::observability::{
    circuit_breaker_state, record_circuit_breaker_rejected, record_circuit_breaker_state,
};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitBreakerState {
    /// Circuit is closed, calls flow normally.
    Closed,
    /// Circuit is open, calls are rejected.
    Open,
    /// Circuit admits a single trial call.
    HalfOpen,
}

impl CircuitBreakerState {
    const fn gauge_value(self) -> f64 {
        match self {
            Self::Closed => circuit_breaker_state::CLOSED,
            Self::Open => circuit_breaker_state::OPEN,
            Self::HalfOpen => circuit_breaker_state::HALF_OPEN,
        }
    }
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Duration to stay in `OPEN` state.
    pub break_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 4,
            break_duration: Duration::from_secs(3),
        }
    }
}

/// Mutable breaker state, always read and written under one lock.
#[derive(Debug)]
struct BreakerInner {
    state: CircuitBreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Circuit breaker for one service.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Service name for logging.
    name: String,
    /// Configuration.
    config: CircuitBreakerConfig,
    /// State machine.
    inner: Mutex<BreakerInner>,
    /// Total calls forwarded (for metrics).
    total_calls: AtomicU64,
    /// Total failed calls (for metrics).
    total_failures: AtomicU64,
    /// Calls rejected while open (for metrics).
    rejected_calls: AtomicU64,
    /// State transitions counter (for metrics).
    state_transitions: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitBreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            state_transitions: AtomicU64::new(0),
        }
    }

    /// Get the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state.
    ///
    /// An open circuit whose break duration has elapsed still reports
    /// `Open`; the next call performs the move to `HalfOpen`.
    #[must_use]
    pub fn state(&self) -> CircuitBreakerState {
        self.inner.lock().state
    }

    /// Current run of consecutive failures.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Run `operation` through the breaker.
    ///
    /// While open, returns [`InvocationError::CircuitOpen`] without calling
    /// `operation`. Otherwise the operation's result is recorded and
    /// returned unchanged.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, InvocationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, InvocationError>>,
    {
        let admission = self.admit()?;
        let mut guard = TrialGuard {
            breaker: self,
            armed: admission == Admission::Trial,
        };

        let result = operation().await;
        guard.armed = false;

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        match &result {
            Ok(_) => self.record_success(admission),
            Err(error) => self.record_failure(admission, error),
        }

        result
    }

    /// Decide whether a call may proceed, moving `OPEN` to `HALF_OPEN`
    /// when the break duration has elapsed.
    fn admit(&self) -> Result<Admission, InvocationError> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitBreakerState::Closed => Ok(Admission::Normal),
            CircuitBreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map_or(self.config.break_duration, |opened| opened.elapsed());

                if elapsed >= self.config.break_duration {
                    self.transition(&mut inner, CircuitBreakerState::HalfOpen);
                    inner.trial_in_flight = true;
                    Ok(Admission::Trial)
                } else {
                    drop(inner);
                    Err(self.reject(self.config.break_duration - elapsed))
                }
            }
            CircuitBreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    drop(inner);
                    Err(self.reject(Duration::ZERO))
                } else {
                    inner.trial_in_flight = true;
                    Ok(Admission::Trial)
                }
            }
        }
    }

    fn reject(&self, retry_after: Duration) -> InvocationError {
        self.rejected_calls.fetch_add(1, Ordering::Relaxed);
        record_circuit_breaker_rejected(&self.name);

        tracing::debug!(
            name = %self.name,
            retry_after_ms = retry_after.as_millis(),
            "Call rejected by open circuit"
        );

        InvocationError::CircuitOpen {
            service: self.name.clone(),
            retry_after,
        }
    }

    fn record_success(&self, admission: Admission) {
        let mut inner = self.inner.lock();

        match (admission, inner.state) {
            (Admission::Trial, CircuitBreakerState::HalfOpen) => {
                inner.trial_in_flight = false;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                self.transition(&mut inner, CircuitBreakerState::Closed);
            }
            (_, CircuitBreakerState::Closed) => inner.consecutive_failures = 0,
            // A call admitted before the circuit opened finished late.
            _ => {}
        }
    }

    fn record_failure(&self, admission: Admission, error: &InvocationError) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        match (admission, inner.state) {
            (Admission::Trial, CircuitBreakerState::HalfOpen) => {
                inner.trial_in_flight = false;
                self.open(&mut inner, error);
            }
            (_, CircuitBreakerState::Closed) => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.open(&mut inner, error);
                }
            }
            _ => {}
        }
    }

    fn release_trial(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitBreakerState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    /// Move to `OPEN` and (re)start the break timer.
    fn open(&self, inner: &mut BreakerInner, cause: &InvocationError) {
        let previous = inner.state;
        inner.opened_at = Some(Instant::now());
        self.transition(inner, CircuitBreakerState::Open);

        tracing::warn!(
            name = %self.name,
            from = %previous,
            to = "OPEN",
            consecutive_failures = inner.consecutive_failures,
            break_duration_ms = self.config.break_duration.as_millis(),
            error = %cause,
            "Circuit breaker opened"
        );
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitBreakerState) {
        let previous = inner.state;
        if previous == to {
            return;
        }

        inner.state = to;
        self.state_transitions.fetch_add(1, Ordering::Relaxed);
        record_circuit_breaker_state(&self.name, to.gauge_value());

        match to {
            CircuitBreakerState::HalfOpen => tracing::info!(
                name = %self.name,
                from = %previous,
                to = %to,
                "Circuit breaker testing"
            ),
            CircuitBreakerState::Closed => tracing::info!(
                name = %self.name,
                from = %previous,
                to = %to,
                "Circuit breaker closed"
            ),
            CircuitBreakerState::Open => {}
        }
    }

    /// Force the circuit breaker to open (for operators or tests).
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        inner.trial_in_flight = false;
        inner.opened_at = Some(Instant::now());
        self.transition(&mut inner, CircuitBreakerState::Open);
    }

    /// Force the circuit breaker to close and clear its failure count.
    pub fn force_close(&self) {
        let mut inner = self.inner.lock();
        inner.trial_in_flight = false;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        self.transition(&mut inner, CircuitBreakerState::Closed);
    }

    /// Get metrics for this circuit breaker.
    #[must_use]
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let (state, consecutive_failures) = {
            let inner = self.inner.lock();
            (inner.state, inner.consecutive_failures)
        };

        CircuitBreakerMetrics {
            name: self.name.clone(),
            state,
            consecutive_failures,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            state_transitions: self.state_transitions.load(Ordering::Relaxed),
        }
    }
}

/// Frees the half-open trial slot if the trial future is dropped early.
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.release_trial();
        }
    }
}

/// Metrics for a circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Service name.
    pub name: String,
    /// Current state.
    pub state: CircuitBreakerState,
    /// Current run of consecutive failures.
    pub consecutive_failures: u32,
    /// Calls forwarded to the operation.
    pub total_calls: u64,
    /// Forwarded calls that failed.
    pub total_failures: u64,
    /// Calls rejected without being forwarded.
    pub rejected_calls: u64,
    /// Number of state transitions.
    pub state_transitions: u64,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    use super::*;
    use crate::error::TransportErrorKind;

    fn transport_failure() -> InvocationError {
        InvocationError::transport(TransportErrorKind::Connect, "connection refused")
    }

    async fn fail(breaker: &CircuitBreaker) -> Result<(), InvocationError> {
        breaker.execute(|| async { Err(transport_failure()) }).await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<(), InvocationError> {
        breaker.execute(|| async { Ok(()) }).await
    }

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("test", CircuitBreakerConfig::default())
    }

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 4);
        assert_eq!(config.break_duration, Duration::from_secs(3));
    }

    #[test]
    fn test_initial_state_is_closed() {
        let breaker = breaker();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_consecutive_failures() {
        let breaker = breaker();

        for _ in 0..3 {
            assert!(fail(&breaker).await.is_err());
            assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        }

        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
        assert_eq!(breaker.consecutive_failures(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failures_count_toward_threshold() {
        let breaker = breaker();

        for _ in 0..4 {
            let result: Result<(), _> = breaker
                .execute(|| async {
                    Err(InvocationError::Status {
                        code: 404,
                        body: String::new(),
                    })
                })
                .await;
            assert!(result.is_err());
        }

        assert_eq!(breaker.state(), CircuitBreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_breaks_failure_run() {
        let breaker = breaker();

        for _ in 0..3 {
            let _ = fail(&breaker).await;
        }
        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.consecutive_failures(), 0);

        for _ in 0..3 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_rejects_without_invoking_operation() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_secs(1)).await;

        let invoked = AtomicU32::new(0);
        let result: Result<(), _> = breaker
            .execute(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        match result {
            Err(InvocationError::CircuitOpen {
                service,
                retry_after,
            }) => {
                assert_eq!(service, "test");
                assert_eq!(retry_after, Duration::from_secs(2));
            }
            other => panic!("expected CircuitOpen, got {other:?}"),
        }
        assert_eq!(breaker.metrics().rejected_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_success_closes() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(breaker.state(), CircuitBreakerState::Open);

        let invoked = AtomicU32::new(0);
        breaker
            .execute(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_failure_reopens_and_restarts_timer() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(matches!(
            fail(&breaker).await,
            Err(InvocationError::Transport { .. })
        ));
        assert_eq!(breaker.state(), CircuitBreakerState::Open);

        // Timer restarted at the trial failure, not at the first opening.
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            succeed(&breaker).await,
            Err(InvocationError::CircuitOpen { .. })
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_single_trial() {
        let breaker = Arc::new(breaker());
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_secs(3)).await;

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let trial = {
            let breaker = Arc::clone(&breaker);
            tokio::spawn(async move {
                breaker
                    .execute(|| async move {
                        let _ = release_rx.await;
                        Ok(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitBreakerState::HalfOpen);

        assert!(matches!(
            succeed(&breaker).await,
            Err(InvocationError::CircuitOpen { .. })
        ));

        release_tx.send(()).unwrap();
        trial.await.unwrap().unwrap();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trial_releases_slot() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_secs(3)).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            breaker.execute(|| std::future::pending::<Result<(), InvocationError>>()),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(breaker.state(), CircuitBreakerState::HalfOpen);

        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
    }

    #[test]
    fn test_force_open_and_close() {
        let breaker = breaker();

        breaker.force_open();
        assert_eq!(breaker.state(), CircuitBreakerState::Open);

        breaker.force_close();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.metrics().state_transitions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics() {
        let breaker = breaker();

        succeed(&breaker).await.unwrap();
        succeed(&breaker).await.unwrap();
        let _ = fail(&breaker).await;

        let metrics = breaker.metrics();
        assert_eq!(metrics.name, "test");
        assert_eq!(metrics.state, CircuitBreakerState::Closed);
        assert_eq!(metrics.total_calls, 3);
        assert_eq!(metrics.total_failures, 1);
        assert_eq!(metrics.consecutive_failures, 1);
        assert_eq!(metrics.rejected_calls, 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CircuitBreakerState::Closed.to_string(), "CLOSED");
        assert_eq!(CircuitBreakerState::Open.to_string(), "OPEN");
        assert_eq!(CircuitBreakerState::HalfOpen.to_string(), "HALF_OPEN");
    }
}
