//! # Interrupt sources
//!
//! | Source | Vector | Level         | Raised by                      |
//! |--------|--------|---------------|--------------------------------|
//! | Reset  | 0x000  | non-maskable  | front-end                      |
//! | INT0   | 0x003  | high          | external pin                   |
//! | INT1   | 0x00B  | high          | external pin                   |
//! | INT2   | 0x013  | low           | external pin, Timer 0 low      |
//! | INT3   | 0x01B  | low           | base timer                     |
//! | T0HOV  | 0x023  | low           | Timer 0 high overflow          |
//! | T1HLOV | 0x02B  | low           | Timer 1 low/high overflow      |
//! | SIO0   | 0x033  | low           | serial 0                       |
//! | SIO1   | 0x03B  | low           | serial 1                       |
//! | RFB    | 0x043  | low           | receive buffer full            |
//! | P3     | 0x04B  | low           | port 3 (buttons)               |
//!
//! The table order is the priority order the CPU scans in. The controller
//! itself only stores the sticky pending bits.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptSource {
    Reset,
    Int0,
    Int1,
    Int2,
    Int3,
    T0Hov,
    T1Hlov,
    Sio0,
    Sio1,
    Rfb,
    P3,
}

/// Nesting level of a service routine; a routine can only be interrupted
/// by a source of a strictly higher level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterruptLevel {
    /// No service routine is running.
    #[default]
    None,
    Low,
    High,
    NonMaskable,
}

impl InterruptSource {
    /// Every source, highest priority first.
    pub const PRIORITY: [Self; 11] = [
        Self::Reset,
        Self::Int0,
        Self::Int1,
        Self::Int2,
        Self::Int3,
        Self::T0Hov,
        Self::T1Hlov,
        Self::Sio0,
        Self::Sio1,
        Self::Rfb,
        Self::P3,
    ];

    const fn index(self) -> u8 {
        self as u8
    }

    /// Fixed service routine address.
    #[must_use]
    pub const fn vector(self) -> u16 {
        match self {
            Self::Reset => 0x000,
            Self::Int0 => 0x003,
            Self::Int1 => 0x00B,
            Self::Int2 => 0x013,
            Self::Int3 => 0x01B,
            Self::T0Hov => 0x023,
            Self::T1Hlov => 0x02B,
            Self::Sio0 => 0x033,
            Self::Sio1 => 0x03B,
            Self::Rfb => 0x043,
            Self::P3 => 0x04B,
        }
    }

    #[must_use]
    pub const fn level(self) -> InterruptLevel {
        match self {
            Self::Reset => InterruptLevel::NonMaskable,
            Self::Int0 | Self::Int1 => InterruptLevel::High,
            _ => InterruptLevel::Low,
        }
    }

    /// Whether `IE` bit 7 gates this source.
    #[must_use]
    pub const fn is_maskable(self) -> bool {
        !matches!(self, Self::Reset)
    }
}

/// Pending flags, one sticky bit per [`InterruptSource`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptController {
    pending: u16,
}

impl InterruptController {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: 0 }
    }

    pub fn set(&mut self, source: InterruptSource) {
        self.pending.set_bit(source.index(), true);
    }

    pub fn clear(&mut self, source: InterruptSource) {
        self.pending.set_bit(source.index(), false);
    }

    /// 1 when `source` is pending, 0 otherwise.
    #[must_use]
    pub fn get(&self, source: InterruptSource) -> u8 {
        u8::from(self.is_pending(source))
    }

    #[must_use]
    pub fn is_pending(&self, source: InterruptSource) -> bool {
        self.pending.get_bit(source.index())
    }

    /// Pending sources in priority order.
    pub fn pending(&self) -> impl Iterator<Item = InterruptSource> + '_ {
        InterruptSource::PRIORITY
            .into_iter()
            .filter(|source| self.is_pending(*source))
    }

    pub const fn clear_all(&mut self) {
        self.pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn set_is_idempotent() {
        for source in InterruptSource::PRIORITY {
            let mut ic = InterruptController::new();
            ic.set(source);
            ic.set(source);
            assert_eq!(ic.get(source), 1);

            ic.clear(source);
            assert_eq!(ic.get(source), 0);
        }
    }

    #[test]
    fn clearing_a_clear_source_is_a_noop() {
        let mut ic = InterruptController::new();
        ic.set(InterruptSource::Sio1);
        ic.clear(InterruptSource::P3);
        ic.clear(InterruptSource::P3);

        assert_eq!(ic.get(InterruptSource::P3), 0);
        assert_eq!(ic.get(InterruptSource::Sio1), 1);
    }

    #[test]
    fn sources_do_not_alias() {
        for source in InterruptSource::PRIORITY {
            let mut ic = InterruptController::new();
            ic.set(source);
            assert_eq!(ic.pending().collect::<Vec<_>>(), vec![source]);
        }
    }

    #[test]
    fn pending_in_priority_order() {
        let mut ic = InterruptController::new();
        ic.set(InterruptSource::P3);
        ic.set(InterruptSource::T1Hlov);
        ic.set(InterruptSource::Int0);

        assert_eq!(
            ic.pending().collect::<Vec<_>>(),
            vec![
                InterruptSource::Int0,
                InterruptSource::T1Hlov,
                InterruptSource::P3
            ]
        );
    }

    #[test]
    fn vectors_are_eight_bytes_apart() {
        for pair in InterruptSource::PRIORITY[1..].windows(2) {
            assert_eq!(pair[1].vector() - pair[0].vector(), 8);
        }
    }
}
