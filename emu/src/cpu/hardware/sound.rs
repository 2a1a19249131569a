use serde::{Deserialize, Serialize};

/// Receiver of Timer 1 state changes. Implementations must return
/// immediately; the timer calls them on every tick.
pub trait AudioSink {
    /// Reload value captured when the low counter starts running.
    fn set_period(&mut self, period: u8);

    fn set_enabled(&mut self, enabled: bool);
}

/// The VMU piezo buzzer as seen by Timer 1.
///
/// Keeps the last period and enable state so a front-end can synthesize
/// the square wave; it does not produce samples itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buzzer {
    period: u8,
    enabled: bool,
}

impl Buzzer {
    #[must_use]
    pub const fn period(&self) -> u8 {
        self.period
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Tone frequency in Hz: the counter overflows every `256 - period` cycles.
    #[must_use]
    pub fn frequency(&self, cpu_frequency: f64) -> Option<f64> {
        self.enabled
            .then(|| cpu_frequency / f64::from(256 - u16::from(self.period)))
    }
}

impl AudioSink for Buzzer {
    fn set_period(&mut self, period: u8) {
        if period != self.period {
            tracing::trace!("buzzer period {period:02X}");
        }
        self.period = period;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
