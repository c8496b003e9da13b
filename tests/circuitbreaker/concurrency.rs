use super::{call, items_config};
use item_gateway_circuitbreaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState, OutcomeKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_successes_keep_the_window_bounded() {
    let breaker = CircuitBreaker::new(items_config().build());

    let mut handles = Vec::new();
    for _ in 0..100 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move {
            call(&breaker, OutcomeKind::Success).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let metrics = breaker.metrics().await;
    assert_eq!(metrics.state, CircuitState::Closed);
    assert_eq!(metrics.total_calls, 6);
    assert_eq!(metrics.success_count, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_open_once() {
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

    let mut handles = Vec::new();
    for _ in 0..50 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move {
            call(&breaker, OutcomeKind::Failure).await
        }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert!(breaker.is_open());
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert!(admitted >= 6);
    let metrics = breaker.metrics().await;
    assert_eq!(metrics.rejected_calls as usize + admitted, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn half_open_admits_only_the_trial_batch_under_contention() {
    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("items")
            .sliding_window_size(2)
            .permitted_calls_in_half_open(3)
            .wait_duration_in_open(Duration::from_millis(20))
            .build(),
    );
    breaker.force_open().await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let breaker = breaker.clone();
        handles.push(tokio::spawn(async move { breaker.try_acquire().await.ok() }));
    }
    let mut permits = Vec::new();
    for handle in handles {
        if let Some(permit) = handle.await.unwrap() {
            permits.push(permit);
        }
    }

    assert_eq!(permits.len(), 3);
    assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    for permit in permits {
        breaker
            .record(permit, OutcomeKind::Success, super::TICK)
            .await;
    }
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registry_breaker_is_shared_across_tasks() {
    let registry = Arc::new(CircuitBreakerRegistry::new(
        CircuitBreakerConfig::builder()
            .wait_duration_in_open(Duration::from_secs(60))
            .build(),
    ));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let breaker = registry.get_or_create("items");
            call(&breaker, OutcomeKind::Failure).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert!(registry.get_or_create("items").is_open());
    assert_eq!(registry.len(), 1);
}
