//! Process hooks: page table setup, context switch and teardown.

use log::debug;

use crate::error::{Result, VmError};
use crate::swap::{SwapKey, SwapStore};
use crate::table::{read_pte, update_fte, write_fte, write_pte, FrameTableEntry, PageTableEntry};
use crate::vm::VirtualMemory;

pub type Pid = u16;

/// The part of a process control block the memory system owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pcb {
    pub pid: Pid,
    /// Frame holding this process's page table. Fixed for its lifetime.
    pub saved_ptbr: u32,
}

impl<S: SwapStore> VirtualMemory<S> {
    /// Give a new process an empty, protected page table. Returns its frame.
    pub fn proc_init(&mut self, pid: Pid) -> Result<u32> {
        if self.processes.contains_key(&pid) {
            return Err(VmError::DuplicateProcess(pid));
        }

        let pfn = self.free_frame()?;
        self.pm.zero_frame(pfn);
        write_fte(
            &mut self.pm,
            pfn,
            &FrameTableEntry { protected: true, ..Default::default() },
        );

        self.processes.insert(pid, Pcb { pid, saved_ptbr: pfn });
        debug!("proc_init pid {} page table in frame {}", pid, pfn);
        Ok(pfn)
    }

    /// Make `pid`'s page table the active one.
    pub fn context_switch(&mut self, pid: Pid) -> Result<()> {
        let pcb = self.processes.get(&pid).ok_or(VmError::UnknownProcess(pid))?;
        self.ptbr = pcb.saved_ptbr;
        self.current = Some(pid);
        debug!("context switch to pid {} (ptbr {})", pid, self.ptbr);
        Ok(())
    }

    /// Release everything `pid` holds: its resident frames, its swap slots
    /// and finally its page table frame.
    pub fn proc_cleanup(&mut self, pid: Pid) -> Result<()> {
        let pcb = self.processes.remove(&pid).ok_or(VmError::UnknownProcess(pid))?;

        let mut freed_frames = 0;
        let mut freed_slots = 0;
        for vpn in 0..self.config.num_pages as u32 {
            let pte = read_pte(&self.pm, pcb.saved_ptbr, vpn);
            if pte.swap {
                self.swap.free(SwapKey { pid, vpn });
                freed_slots += 1;
            }
            if pte.valid {
                update_fte(&mut self.pm, pte.pfn, |fte| fte.mapped = false);
                freed_frames += 1;
            }
            write_pte(&mut self.pm, pcb.saved_ptbr, vpn, &PageTableEntry::default());
        }
        update_fte(&mut self.pm, pcb.saved_ptbr, |fte| fte.protected = false);

        if self.current == Some(pid) {
            self.current = None;
        }
        debug!(
            "proc_cleanup pid {}: {} frames, {} swap slots, page table frame {}",
            pid, freed_frames, freed_slots, pcb.saved_ptbr
        );
        Ok(())
    }

    pub fn process(&self, pid: Pid) -> Option<&Pcb> {
        self.processes.get(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn vm_with_frames(num_frames: usize) -> VirtualMemory {
        let config = SimConfig::default()
            .with_offset_bits(6)
            .with_frames(num_frames)
            .with_pages(8);
        VirtualMemory::new(config).unwrap()
    }

    #[test]
    fn test_proc_init_allocates_protected_zeroed_table() {
        let mut vm = vm_with_frames(4);
        let pfn = vm.proc_init(1).unwrap();

        assert_eq!(pfn, 1);
        assert_eq!(vm.process(1), Some(&Pcb { pid: 1, saved_ptbr: 1 }));
        let fte = vm.frame_entry(pfn);
        assert!(fte.protected);
        assert!(!fte.mapped);
        for vpn in 0..8 {
            assert_eq!(vm.page_entry(1, vpn).unwrap(), PageTableEntry::default());
        }
    }

    #[test]
    fn test_proc_init_rejects_duplicate() {
        let mut vm = vm_with_frames(4);
        vm.proc_init(1).unwrap();
        assert_eq!(vm.proc_init(1), Err(VmError::DuplicateProcess(1)));
    }

    #[test]
    fn test_proc_init_does_not_switch() {
        let mut vm = vm_with_frames(4);
        vm.proc_init(1).unwrap();
        assert_eq!(vm.current(), None);
        assert_eq!(vm.ptbr(), None);
    }

    #[test]
    fn test_proc_init_zeroes_recycled_frame() {
        let mut vm = vm_with_frames(3);
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();
        vm.write(8, 0xff).unwrap(); // page 0, frame 2
        vm.proc_cleanup(1).unwrap();

        // Frame 1 and 2 are free again; the lowest is reused
        assert_eq!(vm.proc_init(2).unwrap(), 1);
        assert_eq!(vm.proc_init(3).unwrap(), 2);
        // Byte 8 of frame 2 is PTE 1 of process 3, must read as empty
        assert_eq!(vm.page_entry(3, 1).unwrap(), PageTableEntry::default());
    }

    #[test]
    fn test_context_switch() {
        let mut vm = vm_with_frames(4);
        let a = vm.proc_init(1).unwrap();
        let b = vm.proc_init(2).unwrap();

        vm.context_switch(2).unwrap();
        assert_eq!(vm.ptbr(), Some(b));
        assert_eq!(vm.current(), Some(2));

        vm.context_switch(1).unwrap();
        assert_eq!(vm.ptbr(), Some(a));
        assert_eq!(vm.context_switch(9), Err(VmError::UnknownProcess(9)));
        assert_eq!(vm.current(), Some(1));
    }

    #[test]
    fn test_processes_have_separate_address_spaces() {
        let mut vm = vm_with_frames(5);
        vm.proc_init(1).unwrap();
        vm.proc_init(2).unwrap();

        vm.context_switch(1).unwrap();
        vm.write(0, 11).unwrap();
        vm.context_switch(2).unwrap();
        assert_eq!(vm.read(0).unwrap(), 0);
        vm.write(0, 22).unwrap();

        vm.context_switch(1).unwrap();
        assert_eq!(vm.read(0).unwrap(), 11);
    }

    #[test]
    fn test_proc_cleanup_releases_everything() {
        let mut vm = vm_with_frames(4);
        vm.proc_init(1).unwrap();
        vm.context_switch(1).unwrap();

        // Three pages through two data frames: one dirty page ends up in swap
        vm.write(0, 1).unwrap();
        vm.write(64, 2).unwrap();
        vm.write(128, 3).unwrap();
        assert_eq!(vm.swap().slots_in_use(), 1);

        let ptbr = vm.ptbr().unwrap();
        vm.proc_cleanup(1).unwrap();

        assert_eq!(vm.swap().slots_in_use(), 0);
        assert!(!vm.frame_entry(ptbr).protected);
        for pfn in 1..4 {
            assert!(vm.frame_entry(pfn).is_free(), "frame {} still in use", pfn);
        }
        assert!(vm.frame_entry(0).protected);
        assert_eq!(vm.current(), None);
        assert_eq!(vm.process(1), None);
        assert_eq!(vm.page_entry(1, 0), Err(VmError::UnknownProcess(1)));
    }

    #[test]
    fn test_proc_cleanup_leaves_other_processes_alone() {
        let mut vm = vm_with_frames(6);
        vm.proc_init(1).unwrap();
        vm.proc_init(2).unwrap();
        vm.context_switch(1).unwrap();
        vm.write(0, 1).unwrap();
        vm.context_switch(2).unwrap();
        vm.write(0, 2).unwrap();

        vm.proc_cleanup(1).unwrap();
        assert_eq!(vm.current(), Some(2));
        assert_eq!(vm.read(0).unwrap(), 2);
        let pte = vm.page_entry(2, 0).unwrap();
        assert!(vm.frame_entry(pte.pfn).mapped);
    }

    #[test]
    fn test_proc_cleanup_unknown() {
        let mut vm = vm_with_frames(4);
        assert_eq!(vm.proc_cleanup(3), Err(VmError::UnknownProcess(3)));
    }
}
