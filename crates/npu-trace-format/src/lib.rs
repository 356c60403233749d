//! On-wire format of the NPU firmware event-trace buffer.
//!
//! This crate intentionally stays dependency-free and only describes byte
//! layouts: the shared ring footer, the fixed-stride log records, and the
//! device-tick to host-time translation. All multi-byte fields are
//! little-endian and are decoded field-by-field with bounds checks;
//! nothing here reinterprets raw memory as structs.

mod format;
mod record;
mod time;

pub use format::{
    RingFooter, FOOTER_HEAD_OFFSET, FOOTER_SIZE, FOOTER_TAIL_OFFSET, RING_SIZE, TRACE_BUFFER_SIZE,
};
pub use record::{EventRecord, RecordIter, RECORD_STRIDE};
pub use time::{TickTranslator, TICKS_PER_US};
