//! Interrupt-context drain of the shared ring into a linear scratch area.

use crate::buffer::SharedTraceBuffer;
use crate::hal::MemoryBus;
use crate::TraceError;

/// Copies every byte the producer had published at entry into `scratch`
/// and advances the consumer cursor. Returns the number of bytes copied;
/// zero means the ring was empty.
///
/// The producer cursor is snapshotted once on entry and never re-read:
/// bytes published while the copy runs are left for the next drain, which
/// keeps the loop bounded even under sustained producer overrun. A drain
/// wraps the ring at most once, so the copy loop runs at most twice.
///
/// If the footer yields a run longer than the ring or than the remaining
/// scratch capacity, the drain aborts with [`TraceError::CorruptRingState`]
/// without copying further or advancing the consumer cursor, so no bytes
/// are silently lost or double-counted.
pub fn drain(
    mem: &mut dyn MemoryBus,
    buffer: &SharedTraceBuffer,
    scratch: &mut [u8],
) -> Result<usize, TraceError> {
    let ring = buffer.ring_len();
    if ring == 0 {
        return Ok(0);
    }

    let footer = buffer.read_footer(mem)?;
    let tail = footer.tail_offset;
    let tail_wrapped = (tail % ring as u64) as usize;
    let mut head = (footer.head_offset % ring as u64) as usize;

    if tail_wrapped == head {
        return Ok(0);
    }

    let mut copied = 0usize;
    loop {
        // Contiguous run for this pass: up to the tail, or to the physical
        // end of the ring when the pending region wraps.
        let run = if tail_wrapped > head {
            tail_wrapped - head
        } else {
            ring - head
        };
        if run > ring || run > scratch.len() - copied {
            return Err(TraceError::CorruptRingState {
                run,
                capacity: scratch.len() - copied,
            });
        }

        mem.read_physical(buffer.ring_addr(head), &mut scratch[copied..copied + run])?;
        copied += run;
        head = (head + run) % ring;
        if head == tail_wrapped {
            break;
        }
    }

    // Publish absolute consumer progress: the unbounded tail snapshot, not
    // the wrapped position.
    buffer.write_head(mem, tail)?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{DmaRegion, MemoryError};
    use npu_trace_format::{FOOTER_HEAD_OFFSET, FOOTER_SIZE, FOOTER_TAIL_OFFSET};

    struct TestMem {
        buf: Vec<u8>,
    }

    impl TestMem {
        fn new(size: usize) -> Self {
            Self {
                buf: vec![0u8; size],
            }
        }
    }

    impl MemoryBus for TestMem {
        fn read_physical(&self, paddr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
            let start = paddr as usize;
            let end = start
                .checked_add(buf.len())
                .filter(|&end| end <= self.buf.len())
                .ok_or(MemoryError::OutOfBounds {
                    addr: paddr,
                    len: buf.len(),
                })?;
            buf.copy_from_slice(&self.buf[start..end]);
            Ok(())
        }

        fn write_physical(&mut self, paddr: u64, buf: &[u8]) -> Result<(), MemoryError> {
            let start = paddr as usize;
            let end = start
                .checked_add(buf.len())
                .filter(|&end| end <= self.buf.len())
                .ok_or(MemoryError::OutOfBounds {
                    addr: paddr,
                    len: buf.len(),
                })?;
            self.buf[start..end].copy_from_slice(buf);
            Ok(())
        }
    }

    /// Builds a buffer with a 100-byte ring at address 0, ring bytes set
    /// to their offset, and the given footer cursors.
    fn ring100(head: u64, tail: u64) -> (TestMem, SharedTraceBuffer) {
        let total = 100 + FOOTER_SIZE;
        let mut mem = TestMem::new(total);
        for i in 0..100u8 {
            mem.buf[i as usize] = i;
        }
        mem.buf[100 + FOOTER_TAIL_OFFSET..100 + FOOTER_TAIL_OFFSET + 8]
            .copy_from_slice(&tail.to_le_bytes());
        mem.buf[100 + FOOTER_HEAD_OFFSET..100 + FOOTER_HEAD_OFFSET + 8]
            .copy_from_slice(&head.to_le_bytes());
        let buffer = SharedTraceBuffer::new(DmaRegion {
            device_addr: 0,
            len: total,
        });
        (mem, buffer)
    }

    #[test]
    fn linear_region_copies_in_one_pass() {
        let (mut mem, buffer) = ring100(10, 35);
        let mut scratch = [0u8; 101];

        let copied = drain(&mut mem, &buffer, &mut scratch).unwrap();
        assert_eq!(copied, 25);
        assert_eq!(&scratch[..25], &mem.buf[10..35]);
        assert_eq!(buffer.read_footer(&mem).unwrap().head_offset, 35);
    }

    #[test]
    fn wrapped_region_copies_in_two_passes() {
        // head 90, tail 105 (wrapped position 5): 10 bytes off the end,
        // then 5 from the start.
        let (mut mem, buffer) = ring100(90, 105);
        let mut scratch = [0u8; 101];

        let copied = drain(&mut mem, &buffer, &mut scratch).unwrap();
        assert_eq!(copied, 15);
        assert_eq!(&scratch[..10], &mem.buf[90..100]);
        assert_eq!(&scratch[10..15], &mem.buf[0..5]);
        // Consumer progress is the absolute counter, not the wrapped position.
        assert_eq!(buffer.read_footer(&mem).unwrap().head_offset, 105);
    }

    #[test]
    fn empty_ring_returns_zero_without_touching_footer() {
        let (mut mem, buffer) = ring100(40, 140);
        let before = buffer.read_footer(&mem).unwrap();

        assert_eq!(drain(&mut mem, &buffer, &mut [0u8; 101]).unwrap(), 0);
        assert_eq!(buffer.read_footer(&mem).unwrap(), before);
    }

    #[test]
    fn run_exceeding_scratch_aborts_without_advancing_head() {
        // Footer claims 80 pending bytes but scratch can only take 16:
        // treat as corrupt, copy nothing the caller could misinterpret,
        // leave the consumer cursor alone.
        let (mut mem, buffer) = ring100(0, 80);
        let mut scratch = [0u8; 16];

        let err = drain(&mut mem, &buffer, &mut scratch).unwrap_err();
        assert!(matches!(
            err,
            TraceError::CorruptRingState {
                run: 80,
                capacity: 16
            }
        ));
        assert_eq!(buffer.read_footer(&mem).unwrap().head_offset, 0);
    }

    #[test]
    fn unbounded_cursors_wrap_into_ring_positions() {
        // head 1090, tail 1105: same wrapped window as 90/105.
        let (mut mem, buffer) = ring100(1090, 1105);
        let mut scratch = [0u8; 101];

        let copied = drain(&mut mem, &buffer, &mut scratch).unwrap();
        assert_eq!(copied, 15);
        assert_eq!(buffer.read_footer(&mem).unwrap().head_offset, 1105);
    }
}
