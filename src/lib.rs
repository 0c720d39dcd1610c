//! Demand-paged virtual memory simulator.
//!
//! Per-process page tables and a global frame table live inside a fixed
//! pool of simulated physical memory. Accesses fault pages in on demand,
//! evicting (and writing back) victims through a [`SwapStore`] when memory
//! is full.

pub mod address;
mod allocator;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
mod fault;
pub mod io;
pub mod logging;
pub mod memory;
pub mod process;
pub mod replacement;
pub mod stats;
pub mod swap;
pub mod table;
pub mod vm;

// Re-export commonly used items for convenience
pub use address::VirtualAddress;
pub use config::{AccessCosts, SimConfig};
pub use error::{ConfigError, SwapError, VmError};
pub use process::{Pcb, Pid};
pub use replacement::ReplacementPolicy;
pub use stats::{Stats, StatsReport};
pub use swap::{MemorySwap, SwapKey, SwapStore};
pub use vm::{Access, VirtualMemory};
