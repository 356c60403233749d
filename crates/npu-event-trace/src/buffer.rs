use npu_trace_format::{RingFooter, FOOTER_HEAD_OFFSET, FOOTER_SIZE, FOOTER_TAIL_OFFSET};

use crate::hal::{DmaRegion, MemoryBus, MemoryError};

/// The device-visible trace buffer: a ring region followed by the shared
/// cursor footer.
///
/// This type only knows the layout; every byte access goes through the
/// [`MemoryBus`], so the host never aliases device memory directly.
#[derive(Clone, Copy, Debug)]
pub struct SharedTraceBuffer {
    region: DmaRegion,
}

impl SharedTraceBuffer {
    /// Wraps a DMA region already allocated for tracing. The region must
    /// be longer than one footer.
    pub fn new(region: DmaRegion) -> SharedTraceBuffer {
        debug_assert!(region.len > FOOTER_SIZE);
        SharedTraceBuffer { region }
    }

    pub fn device_addr(&self) -> u64 {
        self.region.device_addr
    }

    pub fn total_len(&self) -> usize {
        self.region.len
    }

    /// Length of the ring region preceding the footer.
    pub fn ring_len(&self) -> usize {
        self.region.len - FOOTER_SIZE
    }

    pub(crate) fn region(&self) -> DmaRegion {
        self.region
    }

    fn footer_addr(&self) -> u64 {
        self.region.device_addr + self.ring_len() as u64
    }

    /// Address of the ring byte at `offset`; `offset` must already be
    /// wrapped into the ring.
    pub(crate) fn ring_addr(&self, offset: usize) -> u64 {
        debug_assert!(offset < self.ring_len());
        self.region.device_addr + offset as u64
    }

    pub fn read_footer(&self, mem: &dyn MemoryBus) -> Result<RingFooter, MemoryError> {
        Ok(RingFooter {
            tail_offset: mem.read_u64(self.footer_addr() + FOOTER_TAIL_OFFSET as u64)?,
            head_offset: mem.read_u64(self.footer_addr() + FOOTER_HEAD_OFFSET as u64)?,
        })
    }

    /// Records consumer progress. `head` is the unbounded counter value,
    /// not the wrapped ring position.
    pub(crate) fn write_head(&self, mem: &mut dyn MemoryBus, head: u64) -> Result<(), MemoryError> {
        mem.write_u64(self.footer_addr() + FOOTER_HEAD_OFFSET as u64, head)
    }

    /// Zeroes the whole buffer so cursors left over from a previous
    /// session cannot be mistaken for pending data.
    pub(crate) fn zero(&self, mem: &mut dyn MemoryBus) -> Result<(), MemoryError> {
        mem.write_physical(self.region.device_addr, &vec![0u8; self.region.len])
    }
}
