//! `hotspot` mod provides implementation of "hot-spot" (frequent) parameter flow control.

pub mod cache;
pub mod concurrency_stat_slot;
pub mod param_metric;
pub mod rule;
pub mod rule_manager;
pub mod slot;
pub mod traffic_shaping;

pub use cache::*;
pub use concurrency_stat_slot::*;
pub use param_metric::*;
pub use rule::*;
pub use rule_manager::*;
pub use slot::*;
pub use traffic_shaping::*;
