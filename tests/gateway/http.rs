use super::{mount_camera, registry, resolver_for, short_wait_config, CountingInvoker, GROUP, SERVICE};
use item_gateway::circuitbreaker::{CircuitBreakerConfig, CircuitState};
use item_gateway::invoker::{HttpInvoker, Operation, RemoteValue};
use item_gateway::resolver::{PoolResolver, SelectionStrategy, StaticResolver};
use item_gateway::ResilientGateway;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn camera() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Camera", "price": 300.0}))
}

#[tokio::test]
async fn downstream_slower_than_the_limit_times_out_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(camera().set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let gateway = ResilientGateway::builder()
        .resolver(resolver_for(&server.uri()))
        .invoker(HttpInvoker::new())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = gateway
        .execute(GROUP, SERVICE, Operation::Get(1))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let metrics = gateway.breaker(GROUP).metrics().await;
    assert_eq!(metrics.failure_count, 1);
    assert_eq!(metrics.slow_call_count, 0);
}

#[tokio::test]
async fn slow_successes_trip_the_breaker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(camera().set_delay(Duration::from_millis(80)))
        .mount(&server)
        .await;

    let gateway = ResilientGateway::builder()
        .resolver(resolver_for(&server.uri()))
        .invoker(HttpInvoker::new())
        .registry(registry(
            CircuitBreakerConfig::builder()
                .sliding_window_size(2)
                .slow_call_duration_threshold(Duration::from_millis(40))
                .wait_duration_in_open(Duration::from_secs(60))
                .build(),
        ))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    for _ in 0..2 {
        let value = gateway
            .execute(GROUP, SERVICE, Operation::Get(1))
            .await
            .unwrap();
        assert!(matches!(value, RemoteValue::Product(_)));
    }
    assert!(gateway.breaker(GROUP).is_open());
}

#[tokio::test]
async fn recovers_once_the_downstream_heals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_camera(&server).await;

    let invoker = CountingInvoker::new();
    let gateway = ResilientGateway::builder()
        .resolver(resolver_for(&server.uri()))
        .invoker(invoker.clone())
        .registry(registry(short_wait_config(Duration::from_millis(100))))
        .build()
        .unwrap();

    for _ in 0..2 {
        assert!(gateway.execute(GROUP, SERVICE, Operation::Get(1)).await.is_err());
    }
    assert!(gateway
        .execute(GROUP, SERVICE, Operation::Get(1))
        .await
        .unwrap_err()
        .is_circuit_open());

    tokio::time::sleep(Duration::from_millis(150)).await;
    let value = gateway
        .execute(GROUP, SERVICE, Operation::Get(1))
        .await
        .unwrap();
    assert_eq!(value.into_product().unwrap().name, "Camera");
    assert_eq!(gateway.breaker(GROUP).state().await, CircuitState::Closed);
    assert_eq!(invoker.calls(), 3);
}

#[tokio::test]
async fn endpoint_is_resolved_on_every_call() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(camera())
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(camera())
        .expect(1)
        .mount(&second)
        .await;

    let resolver = Arc::new(StaticResolver::new());
    resolver.insert(SERVICE, &first.uri()).unwrap();
    let gateway = ResilientGateway::builder()
        .resolver(Arc::clone(&resolver))
        .invoker(HttpInvoker::new())
        .build()
        .unwrap();

    gateway.execute(GROUP, SERVICE, Operation::Get(1)).await.unwrap();
    resolver.insert(SERVICE, &second.uri()).unwrap();
    gateway.execute(GROUP, SERVICE, Operation::Get(1)).await.unwrap();
}

#[tokio::test]
async fn unhealthy_instance_is_skipped() {
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&broken)
        .await;
    mount_camera(&healthy).await;

    let resolver = Arc::new(PoolResolver::with_strategy(SelectionStrategy::FirstAvailable));
    resolver.register(SERVICE, &broken.uri()).unwrap();
    resolver.register(SERVICE, &healthy.uri()).unwrap();
    let gateway = ResilientGateway::builder()
        .resolver(Arc::clone(&resolver))
        .invoker(HttpInvoker::new())
        .build()
        .unwrap();

    assert!(gateway.execute(GROUP, SERVICE, Operation::Get(1)).await.is_err());
    assert!(resolver.mark_unhealthy(SERVICE, &broken.uri()));
    assert!(gateway.execute(GROUP, SERVICE, Operation::Get(1)).await.is_ok());
}

#[tokio::test]
async fn unknown_service_fails_without_reaching_the_invoker() {
    let invoker = CountingInvoker::new();
    let gateway = ResilientGateway::builder()
        .resolver(StaticResolver::new())
        .invoker(invoker.clone())
        .build()
        .unwrap();

    let err = gateway
        .execute(GROUP, SERVICE, Operation::List)
        .await
        .unwrap_err();
    assert!(err.is_resolution());
    assert_eq!(invoker.calls(), 0);
    assert_eq!(gateway.breaker(GROUP).metrics().await.failure_count, 1);
}
