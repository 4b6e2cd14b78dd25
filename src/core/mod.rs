/// Basic types of the entries, the slots and the hot parameters.
pub mod base;
/// Configuration of the engines.
pub mod config;
/// Hotspot (frequent) parameter flow control.
pub mod hotspot;
