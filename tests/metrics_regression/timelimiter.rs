use super::helpers::*;
use item_gateway_timelimiter::{TimeLimiter, TimeLimiterConfig};
use serial_test::serial;
use std::time::Duration;

fn limiter(name: &str, limit: Duration) -> TimeLimiter {
    TimeLimiter::new(
        TimeLimiterConfig::builder()
            .name(name)
            .timeout_duration(limit)
            .build(),
    )
}

#[tokio::test]
#[serial]
async fn successful_attempt_metrics() {
    init_recorder();
    let limiter = limiter("tl_success", Duration::from_millis(200));

    let _ = limiter.run(async { Ok::<_, ()>(1) }).await;

    assert_counter_exists("gateway_timelimiter_calls_total");
    assert_metric_has_label("gateway_timelimiter_calls_total", "timelimiter", "tl_success");
    assert_metric_has_label("gateway_timelimiter_calls_total", "result", "success");
    assert_histogram_exists("gateway_timelimiter_call_duration_seconds");
}

#[tokio::test]
#[serial]
async fn timeout_metrics() {
    init_recorder();
    let limiter = limiter("tl_timeout", Duration::from_millis(20));

    let _ = limiter
        .run(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ()>(())
        })
        .await;

    assert_metric_has_label("gateway_timelimiter_calls_total", "timelimiter", "tl_timeout");
    assert_metric_has_label("gateway_timelimiter_calls_total", "result", "timeout");
}

#[tokio::test]
#[serial]
async fn error_metrics() {
    init_recorder();
    let limiter = limiter("tl_error", Duration::from_millis(200));

    let _ = limiter.run(async { Err::<(), _>("refused") }).await;

    assert_metric_has_label("gateway_timelimiter_calls_total", "result", "error");
}
