//! Decodes drained scratch bytes into timestamped sink records.

use npu_trace_format::{RecordIter, TickTranslator};

use crate::hal::TraceSink;

/// Walks `bytes` one record stride at a time, emitting each record with a
/// host-relative timestamp. Returns the number of records emitted.
///
/// A trailing partial stride is dropped: the consumer cursor has already
/// moved past those bytes, so they can never be completed by a later
/// drain, and a truncated record carries no usable fields.
pub fn decode_and_emit(bytes: &[u8], translator: &TickTranslator, sink: &mut dyn TraceSink) -> usize {
    let mut records = RecordIter::new(bytes);
    let trailing = records.trailing();

    let mut emitted = 0;
    for record in records.by_ref() {
        sink.emit(translator.host_us(record.counter), record.kind, record.payload);
        emitted += 1;
    }

    if trailing != 0 {
        tracing::debug!(trailing, "dropping trailing partial record");
    }
    emitted
}
