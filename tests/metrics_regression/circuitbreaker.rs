use super::helpers::*;
use item_gateway_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, OutcomeKind};
use serial_test::serial;
use std::time::Duration;

fn breaker(name: &str) -> CircuitBreaker {
    CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name(name)
            .sliding_window_size(2)
            .wait_duration_in_open(Duration::from_secs(60))
            .build(),
    )
}

async fn complete(breaker: &CircuitBreaker, kind: OutcomeKind) {
    if let Ok(permit) = breaker.try_acquire().await {
        breaker
            .record(permit, kind, Duration::from_millis(3))
            .await;
    }
}

#[tokio::test]
#[serial]
async fn call_counter_and_duration_histogram() {
    init_recorder();
    let breaker = breaker("cb_calls");

    complete(&breaker, OutcomeKind::Success).await;
    complete(&breaker, OutcomeKind::SlowSuccess).await;

    assert_counter_exists("gateway_circuitbreaker_calls_total");
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "circuitbreaker", "cb_calls");
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "outcome", "success");
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "outcome", "slow_success");

    assert_histogram_exists("gateway_circuitbreaker_call_duration_seconds");
    assert_metric_has_label(
        "gateway_circuitbreaker_call_duration_seconds",
        "circuitbreaker",
        "cb_calls",
    );
}

#[tokio::test]
#[serial]
async fn transitions_and_state_gauge() {
    init_recorder();
    let breaker = breaker("cb_transitions");

    complete(&breaker, OutcomeKind::Failure).await;
    complete(&breaker, OutcomeKind::Failure).await;
    assert!(breaker.is_open());

    assert_counter_exists("gateway_circuitbreaker_transitions_total");
    assert_metric_has_label("gateway_circuitbreaker_transitions_total", "from", "Closed");
    assert_metric_has_label("gateway_circuitbreaker_transitions_total", "to", "Open");
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "outcome", "failure");

    assert_gauge_exists("gateway_circuitbreaker_state");
    assert_metric_has_label("gateway_circuitbreaker_state", "circuitbreaker", "cb_transitions");
}

#[tokio::test]
#[serial]
async fn rejections_are_counted() {
    init_recorder();
    let breaker = breaker("cb_rejections");
    breaker.force_open().await;

    assert!(breaker.try_acquire().await.is_err());
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "circuitbreaker", "cb_rejections");
    assert_metric_has_label("gateway_circuitbreaker_calls_total", "outcome", "rejected");
}
