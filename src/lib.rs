//! # Hotspot parameter flow control in Rust
//!
//! A hotspot rule limits the traffic of a resource per value of one of its arguments,
//! for example the QPS of each user id or the concurrency of each product id.
//! The frequent (hot) values are tracked in bounded caches, so the memory is bounded
//! even if the arguments are unbounded.
//!
//! Generally, there are several steps when using the engine:
//! 1. Build a `Sentinel` engine from the default config, a `ConfigEntity` or a YAML file.
//! 2. Load the hotspot rules of the protected resources.
//! 3. Wrap the unit of work by an entry built from `Sentinel::entry()`, and exit the entry after the work.
//!
//! ## Optional features
//! - logger_env: Use `env_logger` to initialize logging.
//! - logger_log4rs: Use `log4rs` to initialize logging.
//!
//! ## Control strategies
//!
//! - `MetricType::QPS` with `ControlStrategy::Reject`: a token bucket per argument value,
//!   refilled every `duration_in_sec`, with extra `burst_count` tokens.
//! - `MetricType::QPS` with `ControlStrategy::Throttling`: the calls of each argument value are evenly spaced,
//!   the call waits at most `max_queueing_time_ms`.
//! - `MetricType::Concurrency`: the in-flight calls of each argument value are limited.
//!
//! Example:
//!
//! ```rust
//! use sentinel_hotspot::{hotspot, Sentinel};
//! use std::sync::Arc;
//!
//! let sentinel = Sentinel::default();
//! sentinel.load_rules(vec![Arc::new(hotspot::Rule {
//!     resource: "example".into(),
//!     metric_type: hotspot::MetricType::QPS,
//!     control_strategy: hotspot::ControlStrategy::Throttling,
//!     threshold: 10,
//!     duration_in_sec: 1,
//!     max_queueing_time_ms: 500,
//!     ..Default::default()
//! })]).unwrap();
//! let r = sentinel.check("example", vec![42.into()], 1);
//! assert!(r.is_pass());
//! ```

/// The engine and the entry API.
pub mod api;
/// Core implementations, the basic types, the configuration and the hotspot module.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
