//! Trait seams for the external collaborators of the trace pipeline.
//!
//! The embedding driver supplies implementations backed by real firmware
//! transport, DMA allocation and interrupt plumbing; tests supply
//! in-memory fakes.

use std::time::Instant;

use thiserror::Error;

/// Errors returned when device-visible memory cannot be accessed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("physical access out of bounds: addr {addr:#x} len {len}")]
    OutOfBounds { addr: u64, len: usize },
}

/// Device-visible physical memory, as seen from the host.
pub trait MemoryBus {
    fn read_physical(&self, paddr: u64, buf: &mut [u8]) -> Result<(), MemoryError>;
    fn write_physical(&mut self, paddr: u64, buf: &[u8]) -> Result<(), MemoryError>;

    fn read_u64(&self, paddr: u64) -> Result<u64, MemoryError> {
        let mut buf = [0u8; 8];
        self.read_physical(paddr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write_u64(&mut self, paddr: u64, val: u64) -> Result<(), MemoryError> {
        self.write_physical(paddr, &val.to_le_bytes())
    }
}

/// Errors returned by the DMA-capable memory allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmaError {
    #[error("DMA allocation of {len} bytes failed")]
    Exhausted { len: usize },
}

/// A device-visible contiguous allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaRegion {
    pub device_addr: u64,
    pub len: usize,
}

/// Host allocator for DMA-capable memory.
pub trait DmaAllocator {
    fn alloc(&mut self, len: usize) -> Result<DmaRegion, DmaError>;
    fn free(&mut self, region: DmaRegion);
}

/// Errors returned by the firmware command channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FirmwareError {
    #[error("firmware rejected the request (status {0:#x})")]
    Rejected(u32),
    #[error("firmware transport error")]
    Transport,
}

/// Response to a start-trace request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartTraceResponse {
    /// Device tick counter sampled by the firmware when tracing started.
    pub current_timestamp: u64,
}

/// Firmware command channel for the trace start/stop requests.
pub trait FirmwareChannel {
    /// Asks the firmware to start publishing records into the buffer at
    /// `buffer_device_addr`.
    fn start_event_trace(
        &mut self,
        buffer_device_addr: u64,
        buffer_len: u32,
    ) -> Result<StartTraceResponse, FirmwareError>;

    fn stop_event_trace(&mut self) -> Result<(), FirmwareError>;
}

/// Errors returned by the interrupt subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrqError {
    #[error("interrupt line {0} is unavailable")]
    Unavailable(u32),
}

/// Interrupt subsystem binding for the log-buffer interrupt line.
pub trait IrqController {
    fn register(&mut self, line: u32) -> Result<(), IrqError>;

    /// Unbinds the line. Blocks until any in-flight handler invocation has
    /// returned, so the caller may free DMA memory afterwards.
    fn unregister(&mut self, line: u32);

    /// Write-to-clear acknowledge of the log-buffer doorbell register.
    fn clear_source(&mut self);
}

/// Host monotonic clock, in microseconds.
pub trait HostClock {
    fn now_us(&self) -> u64;
}

/// [`HostClock`] backed by `std::time::Instant`, measured from clock
/// creation.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

/// Destination for decoded firmware records.
pub trait TraceSink {
    fn emit(&mut self, host_us: u64, kind: u16, payload: u64);
}

/// Sink that forwards each record as one `tracing` event at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&mut self, host_us: u64, kind: u16, payload: u64) {
        tracing::info!(
            target: "npu_event_trace::fw",
            "[{host_us}][FW] type 0x{kind:04x} payload 0x{payload:016x}"
        );
    }
}
