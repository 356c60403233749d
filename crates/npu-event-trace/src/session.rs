//! Enable/disable state machine for the firmware event-trace session.

use std::sync::atomic::{AtomicBool, Ordering};

use npu_trace_format::{TickTranslator, RING_SIZE};

use crate::buffer::SharedTraceBuffer;
use crate::hal::{DmaAllocator, FirmwareChannel, HostClock, IrqController, MemoryBus, TraceSink};
use crate::{alloc, decoder, ring};

/// PCI device id of parts whose firmware can emit event traces.
const TRACE_DEVICE_ID: u16 = 0x17f0;

/// Minimum PCI revision with event-trace firmware support.
const TRACE_MIN_REVISION: u8 = 0x10;

/// PCI identity of the device, captured at probe time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciIdentity {
    pub device_id: u16,
    pub revision: u8,
}

/// Coarse device lifecycle stage, driven by the embedding driver.
///
/// A firmware stop request is only issued once the device has started;
/// before that there is nothing to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DevicePhase {
    Probed,
    Started,
}

/// Per-session state that exists only while tracing is enabled.
struct TraceSession {
    buffer: SharedTraceBuffer,
    translator: TickTranslator,
}

/// Top-level coordinator for the event-trace feature.
///
/// Callers serialize [`set_enabled`](Self::set_enabled) and
/// [`set_phase`](Self::set_phase) under their device-wide lock.
/// [`handle_log_interrupt`](Self::handle_log_interrupt) is the
/// interrupt-context entry point and deliberately reads the enabled flag
/// without that lock; see the `enabled` field for the ordering contract.
pub struct TraceService {
    identity: PciIdentity,
    phase: DevicePhase,
    irq_line: u32,
    fw: Box<dyn FirmwareChannel>,
    dma: Box<dyn DmaAllocator>,
    irq: Box<dyn IrqController>,
    clock: Box<dyn HostClock>,
    sink: Box<dyn TraceSink>,
    /// Read from interrupt context without the device lock. The write
    /// side keeps the flag and `session` consistent: the session is
    /// installed before the flag is set, and the flag is cleared before
    /// the buffer is released. A stale read therefore costs at most one
    /// missed or one harmless extra drain attempt against a still-valid
    /// buffer, never a use after free.
    enabled: AtomicBool,
    session: Option<TraceSession>,
    /// Linear decode area, one full ring plus terminator headroom.
    /// Written only during a drain. Only the single log-buffer interrupt
    /// feeds it; a second producer would need its own scratch or mutual
    /// exclusion.
    scratch: Vec<u8>,
}

impl TraceService {
    pub fn new(
        identity: PciIdentity,
        irq_line: u32,
        fw: Box<dyn FirmwareChannel>,
        dma: Box<dyn DmaAllocator>,
        irq: Box<dyn IrqController>,
        clock: Box<dyn HostClock>,
        sink: Box<dyn TraceSink>,
    ) -> TraceService {
        TraceService {
            identity,
            phase: DevicePhase::Probed,
            irq_line,
            fw,
            dma,
            irq,
            clock,
            sink,
            enabled: AtomicBool::new(false),
            session: None,
            scratch: vec![0u8; RING_SIZE + 1],
        }
    }

    /// True when the device's firmware supports event tracing.
    pub fn is_trace_capable(&self) -> bool {
        self.identity.device_id == TRACE_DEVICE_ID && self.identity.revision >= TRACE_MIN_REVISION
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// The shared buffer of the active session, if tracing is enabled.
    pub fn shared_buffer(&self) -> Option<SharedTraceBuffer> {
        self.session.as_ref().map(|s| s.buffer)
    }

    pub fn set_phase(&mut self, phase: DevicePhase) {
        self.phase = phase;
    }

    /// Turns tracing on or off.
    ///
    /// Best-effort: every failure is logged and leaves the session
    /// disabled; none propagates to the caller, so device bring-up never
    /// fails on account of tracing. Callers must hold their device-wide
    /// lock across this call.
    pub fn set_enabled(&mut self, enable: bool, mem: &mut dyn MemoryBus) {
        if !self.is_trace_capable() {
            tracing::error!(
                "event trace is not supported on this device (id {:#06x} rev {:#04x})",
                self.identity.device_id,
                self.identity.revision
            );
        } else if enable == self.is_enabled() {
            tracing::debug!(enable, "event trace state unchanged");
        } else if enable {
            self.enable(mem);
        } else {
            self.disable();
        }
        // A doorbell left pending by the producer must not fire against a
        // freed (or never allocated) buffer after we return.
        self.irq.clear_source();
    }

    fn enable(&mut self, mem: &mut dyn MemoryBus) {
        let buffer = match alloc::allocate(
            self.dma.as_mut(),
            self.irq.as_mut(),
            self.irq_line,
            mem,
        ) {
            Ok(buffer) => buffer,
            Err(err) => {
                tracing::error!(%err, "event trace enable failed");
                return;
            }
        };

        let response = match self
            .fw
            .start_event_trace(buffer.device_addr(), buffer.total_len() as u32)
        {
            Ok(response) => response,
            Err(err) => {
                // Tracing stays optional: firmware that rejects the start
                // request must not fail device bring-up.
                tracing::error!(%err, "start event trace request failed");
                alloc::release(self.dma.as_mut(), self.irq.as_mut(), self.irq_line, buffer);
                return;
            }
        };

        let translator = TickTranslator::new(response.current_timestamp, self.clock.now_us());
        // Install the session before publishing the flag; the interrupt
        // handler keys off the flag alone.
        self.session = Some(TraceSession { buffer, translator });
        self.enabled.store(true, Ordering::Release);
        tracing::debug!(
            baseline_ticks = response.current_timestamp,
            "event trace enabled"
        );
    }

    fn disable(&mut self) {
        // Clear the flag before tearing anything down so interrupt-context
        // readers stop scheduling drains.
        self.enabled.store(false, Ordering::Release);
        let Some(session) = self.session.take() else {
            return;
        };

        if self.phase >= DevicePhase::Started {
            // A failed stop must not leak the buffer.
            if let Err(err) = self.fw.stop_event_trace() {
                tracing::warn!(%err, "stop event trace request failed");
            }
        } else {
            tracing::debug!("event trace was never started; skipping firmware stop");
        }
        alloc::release(
            self.dma.as_mut(),
            self.irq.as_mut(),
            self.irq_line,
            session.buffer,
        );
        tracing::debug!("event trace disabled");
    }

    /// Interrupt-context entry point for the log-buffer interrupt line.
    ///
    /// Runs to completion without blocking, allocating or taking locks:
    /// the doorbell is acknowledged first (records published during the
    /// drain re-raise it), then the ring is drained and decoded if
    /// tracing is enabled.
    pub fn handle_log_interrupt(&mut self, mem: &mut dyn MemoryBus) {
        tracing::trace!(line = self.irq_line, "log buffer interrupt");
        self.irq.clear_source();

        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let (buffer, translator) = match &self.session {
            Some(session) => (session.buffer, session.translator),
            None => {
                tracing::warn!("enabled flag set without an active session");
                return;
            }
        };

        let drained = match ring::drain(mem, &buffer, &mut self.scratch) {
            Ok(drained) => drained,
            Err(err) => {
                tracing::error!(%err, "trace buffer drain failed");
                return;
            }
        };
        tracing::debug!(drained, "drained firmware trace bytes");
        if drained == 0 {
            return;
        }
        decoder::decode_and_emit(&self.scratch[..drained], &translator, self.sink.as_mut());
    }
}
