//! In-process gateways and the transition catalog contract.

pub mod catalog;
pub mod memory;

pub use catalog::*;
pub use memory::*;
