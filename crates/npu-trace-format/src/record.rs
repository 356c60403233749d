/// Fixed stride of one log record in the ring, in bytes.
pub const RECORD_STRIDE: usize = 16;

/// One decoded firmware log record.
///
/// Record content is opaque to the host: `kind` and `payload` are
/// extracted and reported verbatim, never interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRecord {
    /// Free-running device tick counter sampled by the firmware.
    pub counter: u64,
    /// Record type tag.
    pub kind: u16,
    /// 48-bit payload, reassembled from the on-wire high/low halves.
    pub payload: u64,
}

impl EventRecord {
    /// Decodes one record from a full stride.
    ///
    /// Layout: `counter: u64` at +0, `payload_hi: u16` at +8,
    /// `kind: u16` at +10, `payload_lo: u32` at +12.
    pub fn parse(bytes: &[u8; RECORD_STRIDE]) -> EventRecord {
        let counter = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        let payload_hi = u16::from_le_bytes(bytes[8..10].try_into().unwrap());
        let kind = u16::from_le_bytes(bytes[10..12].try_into().unwrap());
        let payload_lo = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        EventRecord {
            counter,
            kind,
            payload: (payload_hi as u64) << 32 | payload_lo as u64,
        }
    }

    /// Encodes the record into its on-wire stride. The host pipeline only
    /// decodes; this is for synthetic producers in tests and tooling.
    pub fn encode(&self) -> [u8; RECORD_STRIDE] {
        let mut out = [0u8; RECORD_STRIDE];
        out[0..8].copy_from_slice(&self.counter.to_le_bytes());
        out[8..10].copy_from_slice(&(((self.payload >> 32) & 0xffff) as u16).to_le_bytes());
        out[10..12].copy_from_slice(&self.kind.to_le_bytes());
        out[12..16].copy_from_slice(&((self.payload & 0xffff_ffff) as u32).to_le_bytes());
        out
    }
}

/// Iterator over whole-stride records in a drained byte region.
///
/// Iteration stops as soon as fewer than [`RECORD_STRIDE`] bytes remain;
/// [`RecordIter::trailing`] reports how many bytes were left over.
pub struct RecordIter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(bytes: &'a [u8]) -> RecordIter<'a> {
        RecordIter { bytes, pos: 0 }
    }

    /// Number of trailing bytes that do not form a whole record.
    pub fn trailing(&self) -> usize {
        self.bytes.len() % RECORD_STRIDE
    }
}

impl Iterator for RecordIter<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        let end = self.pos.checked_add(RECORD_STRIDE)?;
        if end > self.bytes.len() {
            return None;
        }
        let stride: &[u8; RECORD_STRIDE] = self.bytes[self.pos..end].try_into().unwrap();
        self.pos = end;
        Some(EventRecord::parse(stride))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_payload_halves() {
        let mut bytes = [0u8; RECORD_STRIDE];
        bytes[0..8].copy_from_slice(&42u64.to_le_bytes());
        bytes[8..10].copy_from_slice(&0xabcdu16.to_le_bytes());
        bytes[10..12].copy_from_slice(&0x0007u16.to_le_bytes());
        bytes[12..16].copy_from_slice(&0x1234_5678u32.to_le_bytes());

        let record = EventRecord::parse(&bytes);
        assert_eq!(record.counter, 42);
        assert_eq!(record.kind, 0x0007);
        assert_eq!(record.payload, 0xabcd_1234_5678);
    }

    #[test]
    fn encode_parse_is_identity() {
        let record = EventRecord {
            counter: 0xdead_beef_0042,
            kind: 0x0103,
            payload: 0xffff_0000_0001,
        };
        assert_eq!(EventRecord::parse(&record.encode()), record);
    }

    #[test]
    fn iter_stops_at_partial_stride() {
        let mut bytes = Vec::new();
        for counter in [1u64, 2, 3] {
            bytes.extend_from_slice(
                &EventRecord {
                    counter,
                    kind: 0,
                    payload: 0,
                }
                .encode(),
            );
        }
        bytes.extend_from_slice(&[0u8; 5]);

        let mut iter = RecordIter::new(&bytes);
        assert_eq!(iter.trailing(), 5);
        let counters: Vec<u64> = iter.by_ref().map(|r| r.counter).collect();
        assert_eq!(counters, [1, 2, 3]);
    }

    #[test]
    fn iter_over_empty_region_yields_nothing() {
        assert_eq!(RecordIter::new(&[]).count(), 0);
    }
}
