//! mod `api` provides the topmost fundamental APIs for users using the hotspot engine.
//! Users must initialize a `Sentinel` before loading the rules. There are three ways to perform initialization:
//!
//!  1. `init_default()`, using the environment and the default config.
//!  2. `init_with_config(config_entity: ConfigEntity)`, using customized `ConfigEntity`.
//!  3. `init_with_config_file(config_path: &str)`, using yaml file.
//!
//! Here is the example code to protect a unit of work with a hotspot param flow rule:
//!
//! ```
//! use sentinel_hotspot::{hotspot, init_default, logging};
//! use std::sync::Arc;
//!
//! let sentinel = init_default().unwrap();
//! sentinel
//!     .load_rules(vec![Arc::new(hotspot::Rule {
//!         resource: "some-test".into(),
//!         metric_type: hotspot::MetricType::QPS,
//!         control_strategy: hotspot::ControlStrategy::Reject,
//!         param_index: 0,
//!         threshold: 10,
//!         duration_in_sec: 1,
//!         ..Default::default()
//!     })])
//!     .unwrap_or_else(|err| {
//!         logging::error!("{:?}", err);
//!         false
//!     });
//! let entry_builder = sentinel
//!     .entry("some-test")
//!     .with_args(Some(vec!["user-42".into()]));
//! match entry_builder.build() {
//!     Ok(entry) => {
//!         // Passed, wrap the logic here.
//!         // Be sure the entry is exited finally.
//!         entry.exit()
//!     }
//!     Err(block_err) => {
//!         // Blocked. We could get the block reason from the BlockError.
//!         println!("blocked: {}", block_err);
//!     }
//! }
//! ```

pub mod api;
pub mod init;
pub mod slot_chain;

pub use self::api::*;
pub use init::*;
pub use slot_chain::*;

pub use crate::core::config;
