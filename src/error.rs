//! Error types for the paging simulator.

use thiserror::Error;

use crate::process::Pid;
use crate::swap::SwapKey;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, VmError>;

/// Rejected configuration values. Raised once, before any memory exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("offset bits must be in {min}..={max}, got {got}")]
    OffsetBits { got: u32, min: u32, max: u32 },

    #[error("need at least 2 frames (frame table + one usable), got {0}")]
    TooFewFrames(usize),

    #[error("need at least 1 virtual page")]
    NoPages,

    #[error("frame table for {frames} frames needs {needed} bytes, page holds {page_size}")]
    FrameTableTooLarge { frames: usize, needed: usize, page_size: usize },

    #[error("page table for {pages} pages needs {needed} bytes, page holds {page_size}")]
    PageTableTooLarge { pages: usize, needed: usize, page_size: usize },

    #[error("{frames} frames of {page_size} bytes exceed the {max}-byte memory limit")]
    MemoryTooLarge { frames: usize, page_size: usize, max: usize },
}

/// Swap store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("no swap slot for {0}")]
    Missing(SwapKey),

    #[error("swap buffer is {got} bytes, expected {expected}")]
    BadLength { got: usize, expected: usize },
}

/// Errors surfaced by the core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Every frame is protected; nothing can be handed out or evicted.
    #[error("out of frames: every frame is protected")]
    OutOfFrames,

    #[error("unknown process {0}")]
    UnknownProcess(Pid),

    #[error("process {0} already exists")]
    DuplicateProcess(Pid),

    #[error("no process is active")]
    NoActiveProcess,

    #[error("virtual address {address:#x} outside address space (limit {limit:#x})")]
    AddressOutOfRange { address: u64, limit: u64 },

    #[error("swap error: {0}")]
    Swap(#[from] SwapError),
}
