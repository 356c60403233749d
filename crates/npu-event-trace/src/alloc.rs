//! Paired acquisition of the trace buffer and its interrupt binding.

use npu_trace_format::TRACE_BUFFER_SIZE;

use crate::buffer::SharedTraceBuffer;
use crate::hal::{DmaAllocator, IrqController, MemoryBus};
use crate::TraceError;

/// Allocates the shared buffer and binds the log-buffer interrupt line.
///
/// Acquisition is scoped: a failure at any later stage releases every
/// earlier-acquired resource, so no partial ownership survives an error.
pub(crate) fn allocate(
    dma: &mut dyn DmaAllocator,
    irq: &mut dyn IrqController,
    line: u32,
    mem: &mut dyn MemoryBus,
) -> Result<SharedTraceBuffer, TraceError> {
    let region = dma
        .alloc(TRACE_BUFFER_SIZE)
        .map_err(TraceError::Allocation)?;
    let buffer = SharedTraceBuffer::new(region);

    if let Err(err) = buffer.zero(mem) {
        dma.free(region);
        return Err(err.into());
    }
    if let Err(source) = irq.register(line) {
        dma.free(region);
        return Err(TraceError::IrqRegistration { line, source });
    }

    tracing::debug!(
        "trace buffer allocated: device addr {:#x} len {:#x}",
        region.device_addr,
        region.len
    );
    Ok(buffer)
}

/// Releases the buffer and its interrupt binding.
///
/// The interrupt line is unbound first; `unregister` blocks until any
/// in-flight handler invocation has returned, so the region cannot be
/// freed out from under a running drain.
pub(crate) fn release(
    dma: &mut dyn DmaAllocator,
    irq: &mut dyn IrqController,
    line: u32,
    buffer: SharedTraceBuffer,
) {
    irq.unregister(line);
    dma.free(buffer.region());
}
