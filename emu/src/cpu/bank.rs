use serde::{Deserialize, Serialize};

/// Program memory selected by `EXT` bit 0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bank {
    #[default]
    Rom,
    Flash,
}

impl From<u8> for Bank {
    fn from(ext: u8) -> Self {
        if ext & 1 == 0 { Self::Rom } else { Self::Flash }
    }
}

impl From<Bank> for u8 {
    fn from(bank: Bank) -> Self {
        match bank {
            Bank::Rom => 0,
            Bank::Flash => 1,
        }
    }
}

/// `EXT` as seen by instruction fetch.
///
/// A write to `EXT` is latched as `pending` when the instruction that made
/// it retires and becomes `current` at the next fetch, so the writing
/// instruction still runs entirely from the old bank.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankLatch {
    current: Bank,
    pending: Option<Bank>,
}

impl BankLatch {
    #[must_use]
    pub const fn new(bank: Bank) -> Self {
        Self {
            current: bank,
            pending: None,
        }
    }

    /// Bank used by the instruction being executed.
    #[must_use]
    pub const fn current(&self) -> Bank {
        self.current
    }

    /// Bank the next fetch will use.
    #[must_use]
    pub fn latest(&self) -> Bank {
        self.pending.unwrap_or(self.current)
    }

    /// Records the `EXT` value at the end of an instruction.
    pub fn latch(&mut self, ext: Bank) {
        self.pending = (ext != self.current).then_some(ext);
    }

    /// Applies a latched switch; returns true if the bank changed.
    pub const fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(bank) => {
                self.current = bank;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn switch_waits_for_commit() {
        let mut latch = BankLatch::new(Bank::Rom);
        latch.latch(Bank::Flash);

        assert_eq!(latch.current(), Bank::Rom);
        assert_eq!(latch.latest(), Bank::Flash);

        assert!(latch.commit());
        assert_eq!(latch.current(), Bank::Flash);
        assert!(!latch.commit());
    }

    #[test]
    fn latching_same_bank_is_not_a_switch() {
        let mut latch = BankLatch::new(Bank::Flash);
        latch.latch(Bank::Flash);
        assert!(!latch.commit());
    }

    #[test]
    fn ext_bit_zero_selects_bank() {
        assert_eq!(Bank::from(0xFE), Bank::Rom);
        assert_eq!(Bank::from(0x01), Bank::Flash);
        assert_eq!(u8::from(Bank::Flash), 1);
    }
}
