use std::collections::HashMap;
use std::fmt;

use crate::error::SwapError;
use crate::process::Pid;

/// Identity of a page table entry: the process and the virtual page it maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapKey {
    pub pid: Pid,
    pub vpn: u32,
}

impl fmt::Display for SwapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} vpn {}", self.pid, self.vpn)
    }
}

/// Backing store for evicted pages. Slot allocation is the store's business;
/// the core only calls these four operations.
pub trait SwapStore {
    fn exists(&self, key: SwapKey) -> bool;

    /// Copy the saved page into `dest`, which is exactly one page long.
    fn read(&self, key: SwapKey, dest: &mut [u8]) -> Result<(), SwapError>;

    /// Save `src`, replacing any previous copy.
    fn write(&mut self, key: SwapKey, src: &[u8]) -> Result<(), SwapError>;

    /// Drop the slot. Freeing a missing slot is a no-op.
    fn free(&mut self, key: SwapKey);
}

/// Swap store kept entirely in host memory
#[derive(Debug, Default)]
pub struct MemorySwap {
    slots: HashMap<SwapKey, Box<[u8]>>,
}

impl MemorySwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots_in_use(&self) -> usize {
        self.slots.len()
    }
}

impl SwapStore for MemorySwap {
    fn exists(&self, key: SwapKey) -> bool {
        self.slots.contains_key(&key)
    }

    fn read(&self, key: SwapKey, dest: &mut [u8]) -> Result<(), SwapError> {
        let slot = self.slots.get(&key).ok_or(SwapError::Missing(key))?;
        if slot.len() != dest.len() {
            return Err(SwapError::BadLength { got: dest.len(), expected: slot.len() });
        }
        dest.copy_from_slice(slot);
        Ok(())
    }

    fn write(&mut self, key: SwapKey, src: &[u8]) -> Result<(), SwapError> {
        self.slots.insert(key, src.into());
        Ok(())
    }

    fn free(&mut self, key: SwapKey) {
        self.slots.remove(&key);
    }
}
