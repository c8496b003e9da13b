use item_gateway_timelimiter::{TimeLimiter, TimeLimiterConfig, TimeLimiterError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

fn limiter(limit: Duration) -> TimeLimiter {
    TimeLimiter::new(
        TimeLimiterConfig::builder()
            .name("items")
            .timeout_duration(limit)
            .build(),
    )
}

#[tokio::test]
async fn timeout_fires_close_to_the_limit() {
    let limiter = limiter(Duration::from_millis(50));
    let started = Instant::now();

    let result: Result<(), TimeLimiterError<()>> = limiter
        .run(async {
            sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

    let elapsed = started.elapsed();
    assert!(result.unwrap_err().is_timeout());
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
}

#[tokio::test]
async fn fast_attempt_is_not_delayed() {
    let limiter = limiter(Duration::from_secs(3));
    let started = Instant::now();

    let value = limiter
        .run(async { Ok::<_, ()>(42) })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn attempt_just_under_the_limit_succeeds() {
    let limiter = limiter(Duration::from_secs(3));
    let result = limiter
        .run(async {
            sleep(Duration::from_millis(2_999)).await;
            Ok::<_, ()>("done")
        })
        .await;
    assert_eq!(result.unwrap(), "done");
}

#[tokio::test(start_paused = true)]
async fn abandoned_attempt_never_finishes() {
    let finished = Arc::new(AtomicBool::new(false));
    let f = Arc::clone(&finished);
    let limiter = limiter(Duration::from_millis(100));

    let result = limiter
        .run(async move {
            sleep(Duration::from_secs(1)).await;
            f.store(true, Ordering::SeqCst);
            Ok::<_, ()>(())
        })
        .await;
    assert!(result.unwrap_err().is_timeout());

    sleep(Duration::from_secs(2)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn concurrent_attempts_have_independent_deadlines() {
    let timeouts = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&timeouts);
    let limiter = TimeLimiter::new(
        TimeLimiterConfig::builder()
            .name("items")
            .timeout_duration(Duration::from_millis(60))
            .on_timeout(move || {
                t.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let mut handles = Vec::new();
    for i in 0..10u64 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            let delay = if i % 2 == 0 { 5 } else { 500 };
            limiter
                .run(async move {
                    sleep(Duration::from_millis(delay)).await;
                    Ok::<_, ()>(i)
                })
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(timeouts.load(Ordering::SeqCst), 5);
}
