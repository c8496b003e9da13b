//! Core infrastructure for the item gateway.
//!
//! Holds the event system every resilience component reports through. The
//! components themselves live in their own crates:
//! - `item-gateway-circuitbreaker`: outcome window and circuit breaker
//! - `item-gateway-timelimiter`: per-attempt time limits
//! - `item-gateway-resolver`: endpoint resolution
//! - `item-gateway-invoker`: remote HTTP invocation

pub mod events;

pub use events::{EventListener, EventListeners, FnListener, GatewayEvent, SharedListener};
