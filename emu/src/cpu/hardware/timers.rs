//! # Timers 0 and 1
//!
//! Both timers are a pair of 8-bit up-counters (low and high) with their own
//! reload registers. They can also be chained into one 16-bit counter
//! ("long" mode), in which case the high half only advances when the low
//! half overflows.
//!
//! The control byte has the same layout on both timers:
//!
//! ```text
//!    7      6      5      4      3      2      1      0
//! ┌──────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┐
//! │ HRUN │ LRUN │ LONG │ EXT  │ HOVF │ HIE  │ LOVF │ LIE  │
//! └──────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! The control byte is read again on every tick, so a mode change made by
//! firmware applies on the very next tick. Overflow flags are written back
//! into it; they are only ever set here, firmware clears them.
//!
//! Timer 1 also drives the buzzer: the low reload value is the tone period
//! and the buzzer sounds while the low half runs in 8-bit mode.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::hardware::interrupt_control::{InterruptController, InterruptSource};
use crate::cpu::hardware::sound::AudioSink;
use crate::memory::ram::Ram;
use crate::memory::sfr::{T0CON, T0H, T0HR, T0L, T0LR, T0PRR, T1CNT, T1H, T1HR, T1L, T1LR};
use crate::memory::{MemoryRegion, Shared};

/// Typed view of `T0CON`/`T1CNT`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerControl {
    pub high_run: bool,
    pub low_run: bool,
    pub long_mode: bool,
    /// `T0LEXT`/`ELDT1C`, kept as written.
    pub external: bool,
    pub high_overflow: bool,
    pub high_irq_enable: bool,
    pub low_overflow: bool,
    pub low_irq_enable: bool,
}

impl From<u8> for TimerControl {
    fn from(value: u8) -> Self {
        Self {
            high_run: value.get_bit(7),
            low_run: value.get_bit(6),
            long_mode: value.get_bit(5),
            external: value.get_bit(4),
            high_overflow: value.get_bit(3),
            high_irq_enable: value.get_bit(2),
            low_overflow: value.get_bit(1),
            low_irq_enable: value.get_bit(0),
        }
    }
}

impl From<TimerControl> for u8 {
    fn from(control: TimerControl) -> Self {
        let mut value = 0_u8;
        value.set_bit(7, control.high_run);
        value.set_bit(6, control.low_run);
        value.set_bit(5, control.long_mode);
        value.set_bit(4, control.external);
        value.set_bit(3, control.high_overflow);
        value.set_bit(2, control.high_irq_enable);
        value.set_bit(1, control.low_overflow);
        value.set_bit(0, control.low_irq_enable);
        value
    }
}

/// Where a timer finds its registers and which interrupts it raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerLayout {
    pub control: u16,
    pub low_counter: u16,
    pub low_reload: u16,
    pub high_counter: u16,
    pub high_reload: u16,
    /// Reload register for the low half after a low overflow in long mode.
    pub cascade_reload: u16,
    pub low_overflow: InterruptSource,
    pub high_overflow: InterruptSource,
}

pub const TIMER0: TimerLayout = TimerLayout {
    control: T0CON,
    low_counter: T0L,
    low_reload: T0LR,
    high_counter: T0H,
    high_reload: T0HR,
    cascade_reload: T0LR,
    low_overflow: InterruptSource::Int2,
    high_overflow: InterruptSource::T0Hov,
};

/// In long mode the low half of Timer 1 reloads from `T0LR`, not `T1LR`.
/// That is how the hardware behaves and firmware may rely on it.
pub const TIMER1: TimerLayout = TimerLayout {
    control: T1CNT,
    low_counter: T1L,
    low_reload: T1LR,
    high_counter: T1H,
    high_reload: T1HR,
    cascade_reload: T0LR,
    low_overflow: InterruptSource::T1Hlov,
    high_overflow: InterruptSource::T1Hlov,
};

/// 8-bit clock divider in front of Timer 0, reloaded from `T0PRR`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescaler {
    count: u16,
}

impl Prescaler {
    /// Advances one cycle; returns true when the divided clock fires.
    pub fn step(&mut self, reload: u8) -> bool {
        self.count += 1;
        if self.count > 0xFF {
            self.count = u16::from(reload);
            true
        } else {
            false
        }
    }
}

pub struct Timer {
    layout: TimerLayout,
    ram: Shared<Ram>,
    interrupts: Shared<InterruptController>,
    audio: Option<Shared<dyn AudioSink>>,
    prescaler: Option<Prescaler>,

    low: u16,
    high: u16,
    low_started: u32,
    high_started: u32,
}

impl Timer {
    #[must_use]
    pub const fn new(
        layout: TimerLayout,
        ram: Shared<Ram>,
        interrupts: Shared<InterruptController>,
    ) -> Self {
        Self {
            layout,
            ram,
            interrupts,
            audio: None,
            prescaler: None,
            low: 0,
            high: 0,
            low_started: 0,
            high_started: 0,
        }
    }

    /// Timer 0, clocked through its prescaler.
    #[must_use]
    pub fn timer0(ram: Shared<Ram>, interrupts: Shared<InterruptController>) -> Self {
        Self {
            prescaler: Some(Prescaler::default()),
            ..Self::new(TIMER0, ram, interrupts)
        }
    }

    /// Timer 1, clocked every cycle and wired to the buzzer.
    #[must_use]
    pub fn timer1(
        ram: Shared<Ram>,
        interrupts: Shared<InterruptController>,
        audio: Shared<dyn AudioSink>,
    ) -> Self {
        Self {
            audio: Some(audio),
            ..Self::new(TIMER1, ram, interrupts)
        }
    }

    #[must_use]
    pub const fn low(&self) -> u16 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> u16 {
        self.high
    }

    /// Advances one CPU cycle, going through the prescaler if there is one.
    pub fn step(&mut self) {
        let fire = match &mut self.prescaler {
            Some(prescaler) => {
                let reload = self.ram.borrow().read_raw(usize::from(T0PRR));
                prescaler.step(reload)
            }
            None => true,
        };

        if fire {
            self.tick();
        }
    }

    /// One timer clock.
    pub fn tick(&mut self) {
        let layout = self.layout;
        let mut ram = self.ram.borrow_mut();
        let reload = |ram: &Ram, address: u16| u16::from(ram.read_raw(usize::from(address)));

        let mut control = TimerControl::from(ram.read_raw(usize::from(layout.control)));

        if control.low_run {
            if self.low_started == 0 {
                self.low = reload(&ram, layout.low_reload);
                self.notify_period();
            }
            self.low_started = self.low_started.saturating_add(1);

            // Long mode without the high half running counts at Tcyc/2.
            self.low += if control.long_mode && !control.high_run { 2 } else { 1 };
        } else {
            self.low = reload(&ram, layout.low_reload);
            self.low_started = 0;
        }

        if let Some(audio) = &self.audio {
            audio
                .borrow_mut()
                .set_enabled(control.low_run && !control.long_mode);
        }

        if control.high_run {
            self.high_started = self.high_started.saturating_add(1);
            if !control.long_mode {
                self.high += 1;
            }
        } else {
            self.high = reload(&ram, layout.high_reload);
            self.high_started = 0;
        }

        let mut interrupts = self.interrupts.borrow_mut();

        if self.low > 0xFF {
            if control.long_mode {
                self.high += 1;
                self.low = reload(&ram, layout.cascade_reload);
            } else {
                tracing::trace!("timer at {:03X}: low overflow", layout.control);
                control.low_overflow = true;
                if control.low_irq_enable {
                    interrupts.set(layout.low_overflow);
                }
                self.low = reload(&ram, layout.low_reload);
            }
        }

        if self.high > 0xFF {
            tracing::trace!("timer at {:03X}: high overflow", layout.control);
            control.high_overflow = true;
            if control.high_irq_enable {
                interrupts.set(layout.high_overflow);
            }

            if control.long_mode {
                control.low_overflow = true;
                self.low = reload(&ram, layout.low_reload);
            }
            self.high = reload(&ram, layout.high_reload);
        }

        ram.write_raw(usize::from(layout.control), u8::from(control));
        ram.latch_counter(layout.low_counter, self.low.get_bits(0..=7) as u8);
        ram.latch_counter(layout.high_counter, self.high.get_bits(0..=7) as u8);
    }

    fn notify_period(&self) {
        if let Some(audio) = &self.audio {
            audio
                .borrow_mut()
                .set_period(self.low.get_bits(0..=7) as u8);
        }
    }
}
