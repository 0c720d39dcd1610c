/// Represents the decomposed components of a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u64,
    pub vpn: u32,
    pub offset: u32,
}

impl VirtualAddress {
    /// Split a raw address into (vpn, offset) for pages of `1 << offset_bits` bytes.
    ///
    /// The caller guarantees `va` lies inside the address space, so the
    /// page number always fits a `u32`.
    #[inline]
    pub fn split(va: u64, offset_bits: u32) -> Self {
        let vpn = (va >> offset_bits) as u32;
        let offset = (va & ((1u64 << offset_bits) - 1)) as u32;
        VirtualAddress { va, vpn, offset }
    }
}

/// Physical address of `offset` inside frame `pfn`
#[inline]
pub fn physical_address(pfn: u32, offset: u32, offset_bits: u32) -> usize {
    ((pfn as usize) << offset_bits) + offset as usize
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({:#x}) = (vpn={}, offset={})", self.va, self.vpn, self.offset)
    }
}
