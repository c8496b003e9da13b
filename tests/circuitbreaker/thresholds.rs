use super::{call, items_config};
use item_gateway_circuitbreaker::{CircuitBreaker, CircuitState, OutcomeKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn full_window_of_failures_opens_exactly_once() {
    let opened = Arc::new(AtomicUsize::new(0));
    let o = Arc::clone(&opened);
    let breaker = CircuitBreaker::new(
        items_config()
            .wait_duration_in_open(Duration::from_secs(60))
            .on_state_transition(move |_, to| {
                if to == CircuitState::Open {
                    o.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build(),
    );

    for i in 1..=6 {
        assert!(call(&breaker, OutcomeKind::Failure).await);
        let expected = if i < 6 {
            CircuitState::Closed
        } else {
            CircuitState::Open
        };
        assert_eq!(breaker.state().await, expected, "after failure {i}");
    }

    for _ in 0..10 {
        assert!(!call(&breaker, OutcomeKind::Failure).await);
    }
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn partial_window_never_opens() {
    let breaker = CircuitBreaker::new(items_config().build());
    for _ in 0..5 {
        call(&breaker, OutcomeKind::Failure).await;
    }
    let metrics = breaker.metrics().await;
    assert_eq!(metrics.state, CircuitState::Closed);
    assert_eq!(metrics.failure_rate, 100.0);
}

#[tokio::test]
async fn rate_exactly_at_threshold_opens() {
    let breaker = CircuitBreaker::new(items_config().build());
    for kind in [
        OutcomeKind::Success,
        OutcomeKind::Failure,
        OutcomeKind::Success,
        OutcomeKind::Failure,
        OutcomeKind::Success,
        OutcomeKind::Failure,
    ] {
        call(&breaker, kind).await;
    }
    assert!(breaker.is_open());
}

#[tokio::test]
async fn rate_below_threshold_stays_closed() {
    let breaker = CircuitBreaker::new(items_config().build());
    for kind in [
        OutcomeKind::Failure,
        OutcomeKind::Failure,
        OutcomeKind::Success,
        OutcomeKind::Success,
        OutcomeKind::Success,
        OutcomeKind::Success,
    ] {
        call(&breaker, kind).await;
    }
    let metrics = breaker.metrics().await;
    assert_eq!(metrics.state, CircuitState::Closed);
    assert!((metrics.failure_rate - 100.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn slow_calls_open_on_their_own() {
    let breaker = CircuitBreaker::new(items_config().build());
    for kind in [
        OutcomeKind::SlowSuccess,
        OutcomeKind::Success,
        OutcomeKind::SlowSuccess,
        OutcomeKind::Success,
        OutcomeKind::SlowSuccess,
        OutcomeKind::Success,
    ] {
        call(&breaker, kind).await;
    }
    assert!(breaker.is_open());
}

#[tokio::test]
async fn old_failures_slide_out() {
    let breaker = CircuitBreaker::new(items_config().sliding_window_size(4).build());

    call(&breaker, OutcomeKind::Failure).await;
    for _ in 0..4 {
        call(&breaker, OutcomeKind::Success).await;
    }
    call(&breaker, OutcomeKind::Failure).await;

    let metrics = breaker.metrics().await;
    assert_eq!(metrics.total_calls, 4);
    assert_eq!(metrics.failure_count, 1);
    assert_eq!(metrics.state, CircuitState::Closed);
}

#[tokio::test]
async fn custom_thresholds_apply() {
    let breaker = CircuitBreaker::new(
        items_config()
            .sliding_window_size(10)
            .failure_rate_threshold(20.0)
            .build(),
    );
    for i in 0..10 {
        let kind = if i < 2 {
            OutcomeKind::Failure
        } else {
            OutcomeKind::Success
        };
        call(&breaker, kind).await;
    }
    assert!(breaker.is_open());
}
