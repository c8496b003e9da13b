use super::{items_config, TICK};
use item_gateway_circuitbreaker::{CircuitBreaker, CircuitState, OutcomeKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn outcome_from_before_open_is_discarded() {
    let breaker = CircuitBreaker::new(items_config().build());
    let in_flight = breaker.try_acquire().await.unwrap();

    breaker.force_open().await;
    assert!(!breaker.record(in_flight, OutcomeKind::Success, TICK).await);

    let metrics = breaker.metrics().await;
    assert_eq!(metrics.state, CircuitState::Open);
    assert_eq!(metrics.total_calls, 0);
    assert_eq!(metrics.stale_outcomes, 1);
}

#[tokio::test]
async fn late_closed_outcome_does_not_consume_a_trial_slot() {
    let discarded = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&discarded);
    let breaker = CircuitBreaker::new(
        items_config()
            .sliding_window_size(2)
            .permitted_calls_in_half_open(1)
            .wait_duration_in_open(Duration::from_millis(20))
            .on_event(move |event| {
                use item_gateway_core::GatewayEvent;
                if event.kind() == "stale_outcome_discarded" {
                    d.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build(),
    );

    let slow = breaker.try_acquire().await.unwrap();
    for _ in 0..2 {
        let permit = breaker.try_acquire().await.unwrap();
        breaker.record(permit, OutcomeKind::Failure, TICK).await;
    }
    assert!(breaker.is_open());

    tokio::time::sleep(Duration::from_millis(40)).await;
    let trial = breaker.try_acquire().await.unwrap();
    assert_eq!(trial.state(), CircuitState::HalfOpen);

    // The call admitted before the trip finally returns a failure.
    assert!(!breaker.record(slow, OutcomeKind::Failure, TICK).await);
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);

    assert!(breaker.record(trial, OutcomeKind::Success, TICK).await);
    assert_eq!(breaker.state().await, CircuitState::Closed);
    assert_eq!(discarded.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reset_invalidates_outstanding_permits() {
    let breaker = CircuitBreaker::new(items_config().build());
    breaker.force_open().await;
    breaker.reset().await;

    let permit = breaker.try_acquire().await.unwrap();
    breaker.force_open().await;
    breaker.force_closed().await;

    assert!(!breaker.record(permit, OutcomeKind::Failure, TICK).await);
    assert_eq!(breaker.metrics().await.failure_count, 0);
}
