//! Basic types shared by the slot chain, the entries and the hotspot module.

pub mod block_error;
pub mod constant;
pub mod context;
pub mod entry;
pub mod param;
pub mod result;
pub mod rule;
pub mod slot_chain;

pub use block_error::*;
pub use constant::*;
pub use context::*;
pub use entry::*;
pub use param::*;
pub use result::*;
pub use rule::*;
pub use slot_chain::*;
