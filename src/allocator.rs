//! Free frame allocation and eviction.

use log::{debug, warn};

use crate::error::{Result, VmError};
use crate::swap::{SwapKey, SwapStore};
use crate::table::{read_fte, read_pte, write_fte, write_pte, FrameTableEntry};
use crate::vm::VirtualMemory;

impl<S: SwapStore> VirtualMemory<S> {
    /// Hand out a frame that is neither mapped nor protected.
    ///
    /// Takes the lowest free frame if there is one. Otherwise asks the
    /// replacement policy for a victim, writes it back if dirty, invalidates
    /// its owner's PTE and returns the reclaimed frame. Fails only when every
    /// frame is protected.
    pub fn free_frame(&mut self) -> Result<u32> {
        if let Some(pfn) = (0..self.num_frames()).find(|&pfn| read_fte(&self.pm, pfn).is_free()) {
            return Ok(pfn);
        }

        let victim = self.replacer.select_victim(&mut self.pm).ok_or(VmError::OutOfFrames)?;
        self.evict(victim)?;
        Ok(victim)
    }

    fn evict(&mut self, pfn: u32) -> Result<()> {
        let fte = read_fte(&self.pm, pfn);
        let owner = self
            .processes
            .get(&fte.process)
            .ok_or(VmError::UnknownProcess(fte.process))?;
        let owner_ptbr = owner.saved_ptbr;

        let mut pte = read_pte(&self.pm, owner_ptbr, fte.vpn);
        let key = SwapKey { pid: fte.process, vpn: fte.vpn };
        if !(pte.valid && pte.pfn == pfn) {
            // Stale frame table entry: the page lives elsewhere (or nowhere).
            warn!("evict frame {}: {} is not mapped here, reclaiming only", pfn, key);
            write_fte(&mut self.pm, pfn, &FrameTableEntry::default());
            return Ok(());
        }
        if pte.dirty {
            self.swap.write(key, self.pm.frame(pfn))?;
            self.stats.writebacks += 1;
            pte.swap = true;
        }
        debug!(
            "evict frame {} ({}, {})",
            pfn,
            key,
            if pte.dirty { "written back" } else { "clean" }
        );

        pte.valid = false;
        pte.dirty = false;
        write_pte(&mut self.pm, owner_ptbr, fte.vpn, &pte);
        write_fte(&mut self.pm, pfn, &FrameTableEntry::default());
        Ok(())
    }
}
