/// Device tick rate: the firmware counter advances 24 ticks per host
/// microsecond.
pub const TICKS_PER_US: u64 = 24;

/// Translates device tick counters into host-relative microsecond
/// timestamps.
///
/// `baseline_ticks` is the device counter the firmware reported when
/// tracing started; `baseline_host_us` is the host monotonic time
/// captured when that response arrived. Tick deltas use wrapping
/// subtraction so a counter that wraps (or a record predating the
/// baseline) does not panic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickTranslator {
    baseline_ticks: u64,
    baseline_host_us: u64,
}

impl TickTranslator {
    pub fn new(baseline_ticks: u64, baseline_host_us: u64) -> TickTranslator {
        TickTranslator {
            baseline_ticks,
            baseline_host_us,
        }
    }

    /// Device tick counter captured at session start.
    pub fn baseline_ticks(&self) -> u64 {
        self.baseline_ticks
    }

    /// Host-relative timestamp, in microseconds, for a record counter.
    pub fn host_us(&self, counter: u64) -> u64 {
        counter.wrapping_sub(self.baseline_ticks) / TICKS_PER_US + self.baseline_host_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_map_to_microseconds_past_baseline() {
        let t = TickTranslator::new(1_000, 500);
        assert_eq!(t.host_us(1_000), 500);
        assert_eq!(t.host_us(1_000 + TICKS_PER_US), 501);
        assert_eq!(t.host_us(1_000 + 3 * TICKS_PER_US), 503);
        // Sub-microsecond remainders truncate.
        assert_eq!(t.host_us(1_000 + TICKS_PER_US + 23), 501);
    }

    #[test]
    fn counter_wrap_does_not_panic() {
        let t = TickTranslator::new(u64::MAX - 11, 0);
        assert_eq!(t.host_us(12), 1);
    }
}
