//! Resilient item gateway.
//!
//! Issues product operations against a downstream products service and keeps
//! its callers responsive when that service is slow, failing or unreachable.
//!
//! The pieces compose leaf-first:
//!
//! - [`item_gateway_circuitbreaker`]: count-based breaker per call group
//! - [`item_gateway_timelimiter`]: per-attempt time limit
//! - [`item_gateway_resolver`]: service name to endpoint, per call
//! - [`item_gateway_invoker`]: the HTTP operation itself
//! - [`ResilientGateway`]: breaker, resolution, time limit and outcome
//!   recording around one invocation, with optional fallback
//! - [`ItemService`]: items assembled from products, with the single-item
//!   read path always answered
//!
//! ```rust,no_run
//! use item_gateway::GatewayConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = GatewayConfig::default().item_service()?;
//! let item = service.get_item(1, None).await;
//! println!("{} x {} = {}", item.quantity, item.product.as_ref().map(|p| p.name.as_str()).unwrap_or("?"), item.total()?);
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through `tracing`: fallbacks at info, rejections and failures
//! at debug, timeouts at warn.

pub mod assembler;
pub mod config;
mod error;
mod events;
mod gateway;
pub mod service;

pub use assembler::{random_quantity, to_item, Item};
pub use config::{load_config, ConfigError, GatewayConfig, ValidationError};
pub use error::{BuildError, GatewayError};
pub use events::GatewayCallEvent;
pub use gateway::{ResilientGateway, ResilientGatewayBuilder};
pub use service::{fallback_product, ItemService, WriteFallback};

pub use item_gateway_circuitbreaker as circuitbreaker;
pub use item_gateway_invoker as invoker;
pub use item_gateway_resolver as resolver;
pub use item_gateway_timelimiter as timelimiter;
