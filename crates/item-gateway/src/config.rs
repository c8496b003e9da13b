//! TOML configuration for the gateway and the items service.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [downstream]
//! service = "service-products"
//! base_url = "http://localhost:8001"
//! instances = []
//! resource_path = "/products"
//!
//! [circuit_breaker]
//! sliding_window_size = 6
//! failure_rate_threshold = 50.0
//! slow_call_rate_threshold = 50.0
//! slow_call_duration_ms = 1000
//! wait_duration_in_open_ms = 10000
//! permitted_calls_in_half_open = 3
//!
//! [time_limiter]
//! timeout_ms = 3000
//!
//! [items]
//! group = "items"
//! write_fallback = "propagate"
//!
//! [server]
//! port = 8002
//! config_text = "items service"
//! ```
//!
//! `ITEM_GATEWAY_BASE_URL`, when set, replaces `downstream.base_url`.

use crate::error::BuildError;
use crate::service::{ItemService, WriteFallback};
use crate::ResilientGateway;
use item_gateway_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use item_gateway_invoker::{HttpInvoker, DEFAULT_RESOURCE_PATH};
use item_gateway_resolver::{Endpoint, PoolResolver, ResolutionError};
use item_gateway_timelimiter::{TimeLimiter, TimeLimiterConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `downstream.base_url`.
pub const BASE_URL_ENV: &str = "ITEM_GATEWAY_BASE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {}", join(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One rejected setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the setting, e.g. `circuit_breaker.sliding_window_size`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub downstream: DownstreamConfig,
    pub circuit_breaker: CircuitBreakerSettings,
    pub time_limiter: TimeLimiterSettings,
    pub items: ItemsSettings,
    pub server: ServerSettings,
}

/// Where the products service lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Logical service name resolved on every call.
    pub service: String,
    /// Address used when `instances` is empty.
    pub base_url: String,
    /// Optional instance pool, selected round-robin.
    pub instances: Vec<String>,
    /// Collection path on the service.
    pub resource_path: String,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            service: "service-products".to_string(),
            base_url: "http://localhost:8001".to_string(),
            instances: Vec::new(),
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
        }
    }
}

impl DownstreamConfig {
    /// Addresses to register: the pool if configured, else the base URL.
    pub fn addresses(&self) -> Vec<&str> {
        if self.instances.is_empty() {
            vec![self.base_url.as_str()]
        } else {
            self.instances.iter().map(String::as_str).collect()
        }
    }
}

/// Breaker thresholds. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub sliding_window_size: usize,
    pub failure_rate_threshold: f64,
    pub slow_call_rate_threshold: f64,
    pub slow_call_duration_ms: u64,
    pub wait_duration_in_open_ms: u64,
    pub permitted_calls_in_half_open: usize,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            sliding_window_size: 6,
            failure_rate_threshold: 50.0,
            slow_call_rate_threshold: 50.0,
            slow_call_duration_ms: 1_000,
            wait_duration_in_open_ms: 10_000,
            permitted_calls_in_half_open: 3,
        }
    }
}

/// Per-attempt time limit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeLimiterSettings {
    pub timeout_ms: u64,
}

impl Default for TimeLimiterSettings {
    fn default() -> Self {
        Self { timeout_ms: 3_000 }
    }
}

/// Items service behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemsSettings {
    /// Breaker group for every items call.
    pub group: String,
    /// Write-path failure policy.
    pub write_fallback: WriteFallback,
}

impl Default for ItemsSettings {
    fn default() -> Self {
        Self {
            group: "items".to_string(),
            write_fallback: WriteFallback::Propagate,
        }
    }
}

/// Values reported by the demo API's configuration endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub config_text: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8002,
            config_text: "items service".to_string(),
            author_name: None,
            author_email: None,
        }
    }
}

impl GatewayConfig {
    /// Parses and validates a TOML document. Environment overrides are not applied.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!(base_url = %base_url, "base URL overridden from environment");
            self.downstream.base_url = base_url;
        }
    }

    /// Checks every setting, returning all problems at once.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let cb = &self.circuit_breaker;

        if cb.sliding_window_size == 0 {
            errors.push(ValidationError::new(
                "circuit_breaker.sliding_window_size",
                "must be at least 1",
            ));
        }
        if cb.permitted_calls_in_half_open == 0 {
            errors.push(ValidationError::new(
                "circuit_breaker.permitted_calls_in_half_open",
                "must be at least 1",
            ));
        }
        for (field, value) in [
            ("circuit_breaker.failure_rate_threshold", cb.failure_rate_threshold),
            ("circuit_breaker.slow_call_rate_threshold", cb.slow_call_rate_threshold),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                errors.push(ValidationError::new(
                    field,
                    format!("must be in (0, 100], got {value}"),
                ));
            }
        }
        if self.time_limiter.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "time_limiter.timeout_ms",
                "must be greater than 0",
            ));
        }

        if self.downstream.service.trim().is_empty() {
            errors.push(ValidationError::new("downstream.service", "must not be empty"));
        }
        if self.items.group.trim().is_empty() {
            errors.push(ValidationError::new("items.group", "must not be empty"));
        }

        let addresses = self.downstream.addresses();
        if addresses.iter().all(|a| a.trim().is_empty()) {
            errors.push(ValidationError::new(
                "downstream",
                "at least one address is required",
            ));
        } else {
            let field = if self.downstream.instances.is_empty() {
                "downstream.base_url"
            } else {
                "downstream.instances"
            };
            for address in addresses {
                if let Err(err) = Endpoint::parse(&self.downstream.service, address) {
                    errors.push(ValidationError::new(field, err.to_string()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Breaker configuration for the items group.
    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        let cb = &self.circuit_breaker;
        CircuitBreakerConfig::builder()
            .name(self.items.group.clone())
            .sliding_window_size(cb.sliding_window_size)
            .failure_rate_threshold(cb.failure_rate_threshold)
            .slow_call_rate_threshold(cb.slow_call_rate_threshold)
            .slow_call_duration_threshold(Duration::from_millis(cb.slow_call_duration_ms))
            .wait_duration_in_open(Duration::from_millis(cb.wait_duration_in_open_ms))
            .permitted_calls_in_half_open(cb.permitted_calls_in_half_open)
            .build()
    }

    /// Time limiter configuration.
    pub fn time_limiter_config(&self) -> TimeLimiterConfig {
        TimeLimiterConfig::builder()
            .name(self.items.group.clone())
            .timeout_duration(Duration::from_millis(self.time_limiter.timeout_ms))
            .build()
    }

    /// Resolver holding every configured address for the downstream service.
    pub fn resolver(&self) -> Result<PoolResolver, ResolutionError> {
        let resolver = PoolResolver::new();
        for address in self.downstream.addresses() {
            resolver.register(&self.downstream.service, address)?;
        }
        Ok(resolver)
    }

    /// Wires an [`ItemService`] from this configuration over HTTP.
    ///
    /// The configuration is validated first.
    pub fn item_service(&self) -> Result<ItemService, ConfigError> {
        self.validate().map_err(ConfigError::Validation)?;

        let registry = Arc::new(CircuitBreakerRegistry::new(self.circuit_breaker_config()));
        let gateway = ResilientGateway::builder()
            .resolver(self.resolver()?)
            .invoker(HttpInvoker::new().resource_path(self.downstream.resource_path.clone()))
            .registry(registry)
            .time_limiter(TimeLimiter::new(self.time_limiter_config()))
            .build()?;

        Ok(ItemService::new(gateway, self.downstream.service.clone())
            .with_group(self.items.group.clone())
            .with_write_fallback(self.items.write_fallback))
    }
}

/// Reads, parses, applies environment overrides and validates a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;
    config.apply_env_overrides();
    config.validate().map_err(ConfigError::Validation)?;

    tracing::info!(
        path = %path.display(),
        service = %config.downstream.service,
        group = %config.items.group,
        "configuration loaded"
    );
    Ok(config)
}
