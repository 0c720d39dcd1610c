use std::ops::Range;

/// Flat byte array standing in for physical memory, addressed by
/// `frame * page_size + offset`.
pub struct PhysicalMemory {
    data: Box<[u8]>,
    page_size: usize,
}

impl PhysicalMemory {
    /// Create `num_frames` zeroed frames of `page_size` bytes
    pub fn new(num_frames: usize, page_size: usize) -> Self {
        PhysicalMemory {
            data: vec![0u8; num_frames * page_size].into_boxed_slice(),
            page_size,
        }
    }

    /// Byte at a physical address
    #[inline]
    pub fn read(&self, address: usize) -> u8 {
        self.data[address]
    }

    /// Store one byte at a physical address
    #[inline]
    pub fn write(&mut self, address: usize, value: u8) {
        self.data[address] = value;
    }

    /// Bytes per frame
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of frames backing this memory
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.data.len() / self.page_size
    }

    #[inline]
    fn frame_range(&self, pfn: u32) -> Range<usize> {
        let start = pfn as usize * self.page_size;
        start..start + self.page_size
    }

    pub fn frame(&self, pfn: u32) -> &[u8] {
        &self.data[self.frame_range(pfn)]
    }

    pub fn frame_mut(&mut self, pfn: u32) -> &mut [u8] {
        let range = self.frame_range(pfn);
        &mut self.data[range]
    }

    pub fn zero_frame(&mut self, pfn: u32) {
        self.frame_mut(pfn).fill(0);
    }

    /// Fixed-size record `index` inside frame `pfn`
    pub fn record(&self, pfn: u32, index: usize, size: usize) -> &[u8] {
        let start = pfn as usize * self.page_size + index * size;
        &self.data[start..start + size]
    }

    pub fn record_mut(&mut self, pfn: u32, index: usize, size: usize) -> &mut [u8] {
        let start = pfn as usize * self.page_size + index * size;
        &mut self.data[start..start + size]
    }
}
