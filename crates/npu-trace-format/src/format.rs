/// Total size of the shared trace buffer: ring region plus footer.
pub const TRACE_BUFFER_SIZE: usize = 8192;

/// Size of the metadata footer at the end of the shared buffer.
///
/// Only the two cursors are meaningful; the remaining 48 bytes are
/// reserved by the firmware interface.
pub const FOOTER_SIZE: usize = 64;

/// Size of the logical ring region at the start of the shared buffer.
pub const RING_SIZE: usize = TRACE_BUFFER_SIZE - FOOTER_SIZE;

/// Byte offset of `tail_offset` within the footer.
pub const FOOTER_TAIL_OFFSET: usize = 0;

/// Byte offset of `head_offset` within the footer.
pub const FOOTER_HEAD_OFFSET: usize = 8;

/// Producer/consumer cursors shared between the device and the host.
///
/// Both are unbounded monotonic counters; the effective ring position is
/// the value modulo the ring size. The device advances `tail_offset` as
/// it publishes records, the host advances `head_offset` as it consumes
/// them. `tail_offset == head_offset` means the ring is empty; the
/// producer is expected to stay less than one ring ahead of the consumer,
/// so no separate full flag exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RingFooter {
    pub tail_offset: u64,
    pub head_offset: u64,
}

impl RingFooter {
    /// Decodes a footer from its on-wire form. Returns `None` when fewer
    /// than [`FOOTER_SIZE`] bytes are supplied.
    pub fn parse(bytes: &[u8]) -> Option<RingFooter> {
        if bytes.len() < FOOTER_SIZE {
            return None;
        }
        let tail_offset = u64::from_le_bytes(
            bytes[FOOTER_TAIL_OFFSET..FOOTER_TAIL_OFFSET + 8]
                .try_into()
                .unwrap(),
        );
        let head_offset = u64::from_le_bytes(
            bytes[FOOTER_HEAD_OFFSET..FOOTER_HEAD_OFFSET + 8]
                .try_into()
                .unwrap(),
        );
        Some(RingFooter {
            tail_offset,
            head_offset,
        })
    }
}
