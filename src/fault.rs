use log::debug;

use crate::error::{Result, SwapError, VmError};
use crate::swap::{SwapKey, SwapStore};
use crate::table::{read_pte, write_fte, write_pte, FrameTableEntry};
use crate::vm::VirtualMemory;

impl<S: SwapStore> VirtualMemory<S> {
    /// Install a mapping for the page containing `address` in the active
    /// page table.
    ///
    /// The new frame is filled before either table is touched: from swap if
    /// the page was written back earlier, with zeros otherwise. A failure
    /// therefore never leaves a valid PTE without a populated frame.
    /// A page that is already resident is left alone.
    pub fn page_fault(&mut self, address: u64) -> Result<()> {
        let va = self.check_address(address)?;
        let pid = self.current.ok_or(VmError::NoActiveProcess)?;

        if read_pte(&self.pm, self.ptbr, va.vpn).valid {
            debug!("fault on resident page pid {} vpn {} ignored", pid, va.vpn);
            return Ok(());
        }

        let pfn = self.free_frame()?;

        let mut pte = read_pte(&self.pm, self.ptbr, va.vpn);
        let key = SwapKey { pid, vpn: va.vpn };
        if pte.swap {
            if !self.swap.exists(key) {
                return Err(SwapError::Missing(key).into());
            }
            self.swap.read(key, self.pm.frame_mut(pfn))?;
        } else {
            self.pm.zero_frame(pfn);
        }

        pte.valid = true;
        pte.dirty = false;
        pte.pfn = pfn;
        write_pte(&mut self.pm, self.ptbr, va.vpn, &pte);
        write_fte(
            &mut self.pm,
            pfn,
            &FrameTableEntry {
                mapped: true,
                process: pid,
                vpn: va.vpn,
                ..Default::default()
            },
        );

        self.stats.page_faults += 1;
        debug!(
            "fault {} -> frame {} ({})",
            key,
            pfn,
            if pte.swap { "swapped in" } else { "zero-filled" }
        );
        Ok(())
    }
}
