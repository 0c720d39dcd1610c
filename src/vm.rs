//! The simulated machine: physical memory, frame table, active page table
//! and the access path that ties them together.
//!
//! Fault handling lives in [`crate::fault`], frame allocation in
//! [`crate::allocator`] and the process hooks in [`crate::process`]; they
//! are all `impl VirtualMemory` blocks over the state defined here.

use std::collections::BTreeMap;

use log::trace;

use crate::address::{physical_address, VirtualAddress};
use crate::config::SimConfig;
use crate::constants::FRAME_TABLE_PFN;
use crate::error::{ConfigError, Result, VmError};
use crate::memory::PhysicalMemory;
use crate::process::{Pcb, Pid};
use crate::replacement::Replacer;
use crate::stats::{Stats, StatsReport};
use crate::swap::{MemorySwap, SwapStore};
use crate::table::{read_fte, read_pte, update_fte, update_pte, FrameTableEntry, PageTableEntry};

/// Kind of memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write(u8),
}

pub struct VirtualMemory<S: SwapStore = MemorySwap> {
    pub(crate) config: SimConfig,
    pub(crate) pm: PhysicalMemory,
    pub(crate) swap: S,
    pub(crate) replacer: Replacer,
    pub(crate) processes: BTreeMap<Pid, Pcb>,
    pub(crate) current: Option<Pid>,
    /// Frame of the active page table
    pub(crate) ptbr: u32,
    pub(crate) stats: Stats,
}

impl VirtualMemory<MemorySwap> {
    pub fn new(config: SimConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_swap(config, MemorySwap::new())
    }
}

impl<S: SwapStore> VirtualMemory<S> {
    /// Build the system: zeroed memory with the frame table in frame 0,
    /// which is marked protected.
    pub fn with_swap(config: SimConfig, swap: S) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let mut pm = PhysicalMemory::new(config.num_frames, config.page_size());
        pm.zero_frame(FRAME_TABLE_PFN);
        update_fte(&mut pm, FRAME_TABLE_PFN, |fte| fte.protected = true);

        let replacer = Replacer::new(config.policy, config.seed);
        Ok(VirtualMemory {
            config,
            pm,
            swap,
            replacer,
            processes: BTreeMap::new(),
            current: None,
            ptbr: FRAME_TABLE_PFN,
            stats: Stats::default(),
        })
    }

    /// Read or write one byte at `address` in the active process.
    ///
    /// Faults the page in first if it is not resident. Returns the byte read,
    /// or the byte written.
    pub fn access(&mut self, address: u64, access: Access) -> Result<u8> {
        let va = self.check_address(address)?;
        if self.current.is_none() {
            return Err(VmError::NoActiveProcess);
        }

        let mut pte = read_pte(&self.pm, self.ptbr, va.vpn);
        if !pte.valid {
            self.page_fault(address)?;
            pte = read_pte(&self.pm, self.ptbr, va.vpn);
        }

        // The page table frame, not the data frame, carries the reference.
        update_fte(&mut self.pm, self.ptbr, |fte| fte.referenced = true);

        let pa = physical_address(pte.pfn, va.offset, self.config.offset_bits);
        match access {
            Access::Read => {
                self.stats.reads += 1;
                let value = self.pm.read(pa);
                trace!("read  {} -> pa {:#x} = {:#04x}", va, pa, value);
                Ok(value)
            }
            Access::Write(value) => {
                self.stats.writes += 1;
                self.pm.write(pa, value);
                update_pte(&mut self.pm, self.ptbr, va.vpn, |pte| pte.dirty = true);
                trace!("write {} -> pa {:#x} = {:#04x}", va, pa, value);
                Ok(value)
            }
        }
    }

    pub fn read(&mut self, address: u64) -> Result<u8> {
        self.access(address, Access::Read)
    }

    pub fn write(&mut self, address: u64, value: u8) -> Result<u8> {
        self.access(address, Access::Write(value))
    }

    /// Physical address for `address` in the active process, without faulting
    /// or touching any bits. `None` if the page is not resident.
    pub fn translate(&self, address: u64) -> Result<Option<usize>> {
        let va = self.check_address(address)?;
        if self.current.is_none() {
            return Err(VmError::NoActiveProcess);
        }
        let pte = read_pte(&self.pm, self.ptbr, va.vpn);
        Ok(pte
            .valid
            .then(|| physical_address(pte.pfn, va.offset, self.config.offset_bits)))
    }

    pub(crate) fn check_address(&self, address: u64) -> Result<VirtualAddress> {
        let limit = self.config.address_space_size();
        if address >= limit {
            return Err(VmError::AddressOutOfRange { address, limit });
        }
        Ok(VirtualAddress::split(address, self.config.offset_bits))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Counters and average access time under the configured costs
    pub fn compute_stats(&self) -> StatsReport {
        self.stats.compute(&self.config.costs)
    }

    pub fn swap(&self) -> &S {
        &self.swap
    }

    /// Currently running process
    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    /// Frame of the active page table, if a process is running
    pub fn ptbr(&self) -> Option<u32> {
        self.current.map(|_| self.ptbr)
    }

    pub fn frame_entry(&self, pfn: u32) -> FrameTableEntry {
        read_fte(&self.pm, pfn)
    }

    /// Page table entry of `vpn` in process `pid`
    pub fn page_entry(&self, pid: Pid, vpn: u32) -> Result<PageTableEntry> {
        let pcb = self.processes.get(&pid).ok_or(VmError::UnknownProcess(pid))?;
        Ok(read_pte(&self.pm, pcb.saved_ptbr, vpn))
    }

    pub fn num_frames(&self) -> u32 {
        self.config.num_frames as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 64-byte pages, 4 frames: frame table, one page table, two data frames
    fn small() -> VirtualMemory {
        let config = SimConfig::default().with_offset_bits(6).with_frames(4).with_pages(8);
        VirtualMemory::new(config).unwrap()
    }

    #[test]
    fn test_system_init_protects_frame_table() {
        let vm = small();
        let fte = vm.frame_entry(0);
        assert!(fte.protected);
        assert!(!fte.mapped);
        for pfn in 1..4 {
            assert!(vm.frame_entry(pfn).is_free());
        }
        assert_eq!(vm.ptbr(), None);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = SimConfig::default().with_frames(1);
        assert!(matches!(VirtualMemory::new(config), Err(ConfigError::TooFewFrames(1))));
    }

    #[test]
    fn test_access_without_process() {
        let mut vm = small();
        assert_eq!(vm.read(0), Err(VmError::NoActiveProcess));
        assert_eq!(vm.translate(0), Err(VmError::NoActiveProcess));
    }

    #[test]
    fn test_address_out_of_range() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();
        // 8 pages of 64 bytes
        assert_eq!(
            vm.write(512, 1),
            Err(VmError::AddressOutOfRange { address: 512, limit: 512 })
        );
        assert_eq!(vm.stats().writes, 0);
        assert!(vm.read(511).is_ok());
    }

    #[test]
    fn test_first_access_faults_and_zero_fills() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();

        assert_eq!(vm.translate(70).unwrap(), None);
        assert_eq!(vm.read(70).unwrap(), 0);
        assert_eq!(vm.stats().page_faults, 1);
        assert_eq!(vm.stats().reads, 1);

        let pte = vm.page_entry(1, 1).unwrap();
        assert!(pte.valid);
        assert!(!pte.dirty);
        let fte = vm.frame_entry(pte.pfn);
        assert!(fte.mapped);
        assert_eq!(fte.process, 1);
        assert_eq!(fte.vpn, 1);

        assert_eq!(vm.translate(70).unwrap(), Some(pte.pfn as usize * 64 + 6));
    }

    #[test]
    fn test_write_then_read_same_page() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();

        assert_eq!(vm.write(10, 0xab).unwrap(), 0xab);
        assert_eq!(vm.read(10).unwrap(), 0xab);
        assert_eq!(vm.read(11).unwrap(), 0);
        assert_eq!(vm.stats().page_faults, 1);
        assert!(vm.page_entry(1, 0).unwrap().dirty);
    }

    #[test]
    fn test_read_does_not_set_dirty() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();

        vm.read(0).unwrap();
        assert!(!vm.page_entry(1, 0).unwrap().dirty);
    }

    #[test]
    fn test_access_references_page_table_frame() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();
        let ptbr = vm.ptbr().unwrap();
        assert!(!vm.frame_entry(ptbr).referenced);

        vm.read(0).unwrap();
        assert!(vm.frame_entry(ptbr).referenced);
        let data = vm.page_entry(1, 0).unwrap().pfn;
        assert!(!vm.frame_entry(data).referenced);
    }

    #[test]
    fn test_translate_does_not_touch_anything() {
        let mut vm = small();
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();
        vm.write(3, 1).unwrap();

        let before = *vm.stats();
        vm.translate(3).unwrap();
        vm.translate(200).unwrap();
        assert_eq!(*vm.stats(), before);
        assert!(!vm.page_entry(1, 3).unwrap().valid);
    }
}
