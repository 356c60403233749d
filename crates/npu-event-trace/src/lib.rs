//! Host-side collection pipeline for NPU firmware event traces.
//!
//! The accelerator firmware appends fixed-stride diagnostic records to a
//! shared DMA ring buffer and raises an interrupt when new data is
//! available. This crate owns the host half of that contract:
//!
//! - the enable/disable session state machine ([`TraceService`]),
//! - paired buffer allocation and interrupt binding with rollback,
//! - the interrupt-context drain of the ring into a scratch area,
//! - decoding drained bytes into timestamped sink records.
//!
//! External collaborators (firmware command channel, DMA allocator,
//! interrupt subsystem, host clock, output sink) are trait seams in
//! [`hal`]; the crate never touches real hardware, which keeps the whole
//! pipeline testable against in-memory fakes.
//!
//! Tracing is strictly best-effort diagnostics. Every failure in this
//! subsystem is logged and swallowed; none may fail device bring-up or
//! normal operation.

mod alloc;
mod buffer;
mod decoder;
pub mod hal;
mod ring;
mod session;

pub use buffer::SharedTraceBuffer;
pub use decoder::decode_and_emit;
pub use ring::drain;
pub use session::{DevicePhase, PciIdentity, TraceService};

use thiserror::Error;

/// Errors local to the tracing subsystem.
///
/// None of these propagate out of [`TraceService`]; they surface as log
/// events only. The enum exists so the drain and allocation paths can be
/// exercised directly in tests.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace buffer allocation failed: {0}")]
    Allocation(hal::DmaError),
    #[error("interrupt registration failed on line {line}: {source}")]
    IrqRegistration { line: u32, source: hal::IrqError },
    #[error("corrupt ring state: run of {run} bytes exceeds capacity {capacity}")]
    CorruptRingState { run: usize, capacity: usize },
    #[error(transparent)]
    Memory(#[from] hal::MemoryError),
}
