//! Page table and frame table entries.
//!
//! Both tables live inside simulated physical memory: the frame table in
//! frame 0, each page table in the frame recorded as its process's PTBR.
//! Entries are 8-byte little-endian records:
//!
//! ```text
//! PTE: | flags u8 | pad 3 | pfn u32 |
//! FTE: | flags u8 | pad 1 | pid u16 | vpn u32 |
//! ```

use bitflags::bitflags;

use crate::constants::{FRAME_TABLE_PFN, FTE_SIZE, PTE_SIZE};
use crate::memory::PhysicalMemory;
use crate::process::Pid;

bitflags! {
    /// Flag byte of a page table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PteFlags: u8 {
        const VALID = 1 << 0;
        const DIRTY = 1 << 1;
        const SWAP = 1 << 2;
    }
}

bitflags! {
    /// Flag byte of a frame table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FteFlags: u8 {
        const MAPPED = 1 << 0;
        const PROTECTED = 1 << 1;
        const REFERENCED = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    pub valid: bool,
    pub dirty: bool,
    /// The swap store holds a copy of this page
    pub swap: bool,
    pub pfn: u32,
}

impl PageTableEntry {
    pub fn flags(&self) -> PteFlags {
        let mut flags = PteFlags::empty();
        flags.set(PteFlags::VALID, self.valid);
        flags.set(PteFlags::DIRTY, self.dirty);
        flags.set(PteFlags::SWAP, self.swap);
        flags
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let flags = PteFlags::from_bits_truncate(bytes[0]);
        PageTableEntry {
            valid: flags.contains(PteFlags::VALID),
            dirty: flags.contains(PteFlags::DIRTY),
            swap: flags.contains(PteFlags::SWAP),
            pfn: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn encode(&self, bytes: &mut [u8]) {
        bytes[..PTE_SIZE].fill(0);
        bytes[0] = self.flags().bits();
        bytes[4..8].copy_from_slice(&self.pfn.to_le_bytes());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTableEntry {
    pub mapped: bool,
    pub protected: bool,
    pub referenced: bool,
    pub process: Pid,
    pub vpn: u32,
}

impl FrameTableEntry {
    pub fn flags(&self) -> FteFlags {
        let mut flags = FteFlags::empty();
        flags.set(FteFlags::MAPPED, self.mapped);
        flags.set(FteFlags::PROTECTED, self.protected);
        flags.set(FteFlags::REFERENCED, self.referenced);
        flags
    }

    /// Neither mapped nor protected: can be handed out without eviction
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.mapped && !self.protected
    }

    /// Holds a data page that may be evicted
    #[inline]
    pub fn is_evictable(&self) -> bool {
        self.mapped && !self.protected
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let flags = FteFlags::from_bits_truncate(bytes[0]);
        FrameTableEntry {
            mapped: flags.contains(FteFlags::MAPPED),
            protected: flags.contains(FteFlags::PROTECTED),
            referenced: flags.contains(FteFlags::REFERENCED),
            process: u16::from_le_bytes([bytes[2], bytes[3]]),
            vpn: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn encode(&self, bytes: &mut [u8]) {
        bytes[..FTE_SIZE].fill(0);
        bytes[0] = self.flags().bits();
        bytes[2..4].copy_from_slice(&self.process.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.vpn.to_le_bytes());
    }
}

#[inline]
pub fn read_fte(pm: &PhysicalMemory, pfn: u32) -> FrameTableEntry {
    FrameTableEntry::decode(pm.record(FRAME_TABLE_PFN, pfn as usize, FTE_SIZE))
}

#[inline]
pub fn write_fte(pm: &mut PhysicalMemory, pfn: u32, entry: &FrameTableEntry) {
    entry.encode(pm.record_mut(FRAME_TABLE_PFN, pfn as usize, FTE_SIZE));
}

/// Read-modify-write of one frame table entry
pub fn update_fte(pm: &mut PhysicalMemory, pfn: u32, f: impl FnOnce(&mut FrameTableEntry)) {
    let mut entry = read_fte(pm, pfn);
    f(&mut entry);
    write_fte(pm, pfn, &entry);
}

#[inline]
pub fn read_pte(pm: &PhysicalMemory, ptbr: u32, vpn: u32) -> PageTableEntry {
    PageTableEntry::decode(pm.record(ptbr, vpn as usize, PTE_SIZE))
}

#[inline]
pub fn write_pte(pm: &mut PhysicalMemory, ptbr: u32, vpn: u32, entry: &PageTableEntry) {
    entry.encode(pm.record_mut(ptbr, vpn as usize, PTE_SIZE));
}

/// Read-modify-write of one page table entry
pub fn update_pte(pm: &mut PhysicalMemory, ptbr: u32, vpn: u32, f: impl FnOnce(&mut PageTableEntry)) {
    let mut entry = read_pte(pm, ptbr, vpn);
    f(&mut entry);
    write_pte(pm, ptbr, vpn, &entry);
}
