pub const DEFAULT_OFFSET_BITS: u32 = 10;
pub const DEFAULT_NUM_FRAMES: usize = 32;
pub const DEFAULT_NUM_PAGES: usize = 64;

pub const MIN_OFFSET_BITS: u32 = 4;
pub const MAX_OFFSET_BITS: u32 = 20;

/// Upper bound on simulated physical memory (1 GiB)
pub const MAX_MEMORY_SIZE: usize = 1 << 30;

// on-memory record sizes, in bytes
pub const PTE_SIZE: usize = 8;
pub const FTE_SIZE: usize = 8;

/// Frame holding the frame table. Never handed out by the allocator.
pub const FRAME_TABLE_PFN: u32 = 0;

// access costs, in nanoseconds
pub const MEMORY_READ_TIME: u64 = 100;
pub const DISK_PAGE_READ_TIME: u64 = 250_000;
pub const DISK_PAGE_WRITE_TIME: u64 = 200_000;

pub const DEFAULT_SEED: u64 = 0x5eed;
