use crate::constants::*;
use crate::error::ConfigError;
use crate::replacement::ReplacementPolicy;

/// Per-operation costs used only when computing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessCosts {
    pub memory_read: u64,
    pub disk_read: u64,
    pub disk_write: u64,
}

impl Default for AccessCosts {
    fn default() -> Self {
        AccessCosts {
            memory_read: MEMORY_READ_TIME,
            disk_read: DISK_PAGE_READ_TIME,
            disk_write: DISK_PAGE_WRITE_TIME,
        }
    }
}

/// Fixed system parameters. Checked once with [`SimConfig::validate`]
/// and never changed after a [`crate::VirtualMemory`] is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub offset_bits: u32,
    pub num_frames: usize,
    pub num_pages: usize,
    pub costs: AccessCosts,
    pub policy: ReplacementPolicy,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            offset_bits: DEFAULT_OFFSET_BITS,
            num_frames: DEFAULT_NUM_FRAMES,
            num_pages: DEFAULT_NUM_PAGES,
            costs: AccessCosts::default(),
            policy: ReplacementPolicy::ClockSweep,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimConfig {
    pub fn with_offset_bits(mut self, offset_bits: u32) -> Self {
        self.offset_bits = offset_bits;
        self
    }

    pub fn with_frames(mut self, num_frames: usize) -> Self {
        self.num_frames = num_frames;
        self
    }

    pub fn with_pages(mut self, num_pages: usize) -> Self {
        self.num_pages = num_pages;
        self
    }

    pub fn with_costs(mut self, costs: AccessCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.offset_bits
    }

    /// Bytes of simulated physical memory
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.num_frames * self.page_size()
    }

    /// First virtual address past the end of every process's address space
    #[inline]
    pub fn address_space_size(&self) -> u64 {
        (self.num_pages as u64) << self.offset_bits
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_OFFSET_BITS..=MAX_OFFSET_BITS).contains(&self.offset_bits) {
            return Err(ConfigError::OffsetBits {
                got: self.offset_bits,
                min: MIN_OFFSET_BITS,
                max: MAX_OFFSET_BITS,
            });
        }
        if self.num_frames < 2 {
            return Err(ConfigError::TooFewFrames(self.num_frames));
        }
        if self.num_pages == 0 {
            return Err(ConfigError::NoPages);
        }

        let page_size = self.page_size();
        let ft_bytes = self.num_frames * FTE_SIZE;
        if ft_bytes > page_size {
            return Err(ConfigError::FrameTableTooLarge {
                frames: self.num_frames,
                needed: ft_bytes,
                page_size,
            });
        }
        let pt_bytes = self.num_pages * PTE_SIZE;
        if pt_bytes > page_size {
            return Err(ConfigError::PageTableTooLarge {
                pages: self.num_pages,
                needed: pt_bytes,
                page_size,
            });
        }
        if self.num_frames.checked_mul(page_size).is_none_or(|bytes| bytes > MAX_MEMORY_SIZE) {
            return Err(ConfigError::MemoryTooLarge {
                frames: self.num_frames,
                page_size,
                max: MAX_MEMORY_SIZE,
            });
        }
        Ok(())
    }
}
