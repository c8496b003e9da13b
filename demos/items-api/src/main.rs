//! Items API over the resilient item gateway.
//!
//! A thin HTTP layer: every route maps to one [`ItemService`] call and turns
//! gateway errors into status codes.
//!
//! ```text
//! GET    /items               list items (random quantities); logs `paramRequestItems`
//!                              and the `X-Header-Request-Items` header
//! GET    /items/{id}          one item; never fails, falls back to a substitute product
//! POST   /items               create (201)
//! PUT    /items/{id}          update (201)
//! DELETE /items/{id}          delete (204)
//! GET    /items/fetch-config  configured text and port
//! GET    /health/ready        503 while the items breaker is open
//! GET    /health/live         always 200
//! ```
//!
//! Run it against a products service on port 8001:
//!
//! ```text
//! RUST_LOG=info,item_gateway=debug cargo run -p items-api -- --port 8002
//! ```

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use item_gateway::{load_config, GatewayConfig, GatewayError, Item, ItemService};
use item_gateway::invoker::{Product, TransportErrorKind};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "items-api", about = "Items API backed by a resilient products gateway")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Clone)]
struct AppState {
    items: ItemService,
    config: Arc<GatewayConfig>,
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    let port = cli.port.unwrap_or(config.server.port);
    let state = AppState {
        items: config.item_service()?,
        config: Arc::new(config),
        port,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!(
        service = %state.config.downstream.service,
        addresses = ?state.config.downstream.addresses(),
        "Forwarding product calls"
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/fetch-config", get(fetch_config))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/health/ready", get(health_ready))
        .route("/health/live", get(health_live))
        .with_state(state)
}

/// Item as returned to clients, with its total.
#[derive(Debug, Serialize)]
struct ItemBody {
    product: Option<Product>,
    quantity: u32,
    total: Option<f64>,
}

impl From<Item> for ItemBody {
    fn from(item: Item) -> Self {
        let total = item.total().ok();
        Self {
            product: item.product,
            quantity: item.quantity,
            total,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuantityParams {
    quantity: Option<u32>,
}

/// Header forwarded by upstream routers on list requests.
const REQUEST_ITEMS_HEADER: &str = "x-header-request-items";

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(rename = "paramRequestItems")]
    param_request_items: Option<String>,
}

fn request_items_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ITEMS_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Gateway error rendered as a JSON response.
struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::CircuitOpen { .. } | GatewayError::Resolution(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::Transport(e) if e.kind == TransportErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        GatewayError::Transport(_) | GatewayError::UnexpectedResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        GatewayError::MissingProduct => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        (
            status,
            Json(serde_json::json!({
                "error": self.0.kind(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

async fn list_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ItemBody>>, ApiError> {
    tracing::info!(
        param_request_items = ?params.param_request_items,
        header_request_items = ?request_items_header(&headers),
        "listing items"
    );
    let items = state.items.list_items().await?;
    Ok(Json(items.into_iter().map(ItemBody::from).collect()))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<QuantityParams>,
) -> Json<ItemBody> {
    Json(state.items.get_item(id, params.quantity).await.into())
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<Item>,
) -> Result<(StatusCode, Json<ItemBody>), ApiError> {
    let created = state.items.create_item(item).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(item): Json<Item>,
) -> Result<(StatusCode, Json<ItemBody>), ApiError> {
    let updated = state.items.update_item(id, item).await?;
    Ok((StatusCode::CREATED, Json(updated.into())))
}

async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.items.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let server = &state.config.server;
    let mut body = serde_json::json!({
        "configTextMsg": server.config_text,
        "server.port": state.port.to_string(),
    });
    if let (Some(name), Some(email)) = (&server.author_name, &server.author_email) {
        body["author.name"] = serde_json::json!(name);
        body["author.email"] = serde_json::json!(email);
    }
    Json(body)
}

/// Readiness probe: 200 when the items breaker is closed or half-open, 503 when open.
async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let breaker = state.items.gateway().breaker(state.items.group());
    let status = StatusCode::from_u16(breaker.http_status()).unwrap_or(StatusCode::OK);
    let metrics = breaker.metrics().await;

    (
        status,
        Json(serde_json::json!({
            "status": breaker.health_status(),
            "circuit_state": breaker.state_sync(),
            "metrics": metrics,
        })),
    )
}

/// Liveness probe; always 200.
async fn health_live() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}
