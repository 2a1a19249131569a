use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::cpu::psw::Psw;
use crate::memory::MemoryRegion;
use crate::memory::sfr::{PSW, SFR_START, XBNK, XRAM_START};

/// Size of the 9-bit RAM address space.
pub const RAM_SIZE: usize = 0x200;
const MAIN_BANK_SIZE: usize = 0x100;
const SFR_SIZE: usize = 0x80;
const XRAM_BANK_SIZE: usize = 0x80;
const XRAM_BANKS: usize = 3;

/// Internal RAM of the LC86K.
///
/// ```text
/// 0x000 ┌──────────────────────┐
///       │ main RAM (bank 0/1)  │ ← PSW.RAMBK0
/// 0x100 ├──────────────────────┤
///       │ SFR                  │
/// 0x180 ├──────────────────────┤
///       │ XRAM (bank 0/1/2)    │ ← XBNK
/// 0x1FF └──────────────────────┘
/// ```
///
/// Timer counters that share an address with their reload register are
/// kept in a latch: a semantic read of such an address sees the live
/// counter, while writes and raw reads go to the reload register.
#[serde_as]
#[derive(Serialize, Deserialize)]
pub struct Ram {
    #[serde_as(as = "[[_; 256]; 2]")]
    main: [[u8; MAIN_BANK_SIZE]; 2],

    #[serde_as(as = "[_; 128]")]
    sfr: [u8; SFR_SIZE],

    #[serde_as(as = "[[_; 128]; 3]")]
    xram: [[u8; XRAM_BANK_SIZE]; XRAM_BANKS],

    #[serde_as(as = "[_; 128]")]
    counter_latches: [Option<u8>; SFR_SIZE],
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

enum Cell {
    Main { bank: usize, offset: usize },
    Sfr(usize),
    Xram { bank: usize, offset: usize },
}

impl Ram {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            main: [[0; MAIN_BANK_SIZE]; 2],
            sfr: [0; SFR_SIZE],
            xram: [[0; XRAM_BANK_SIZE]; XRAM_BANKS],
            counter_latches: [None; SFR_SIZE],
        }
    }

    fn locate(&self, address: usize) -> Cell {
        let address = address % RAM_SIZE;
        let sfr_start = usize::from(SFR_START);
        let xram_start = usize::from(XRAM_START);

        if address < sfr_start {
            let bank = usize::from(Psw::from(self.sfr_at(PSW)).ram_bank());
            Cell::Main {
                bank,
                offset: address,
            }
        } else if address < xram_start {
            Cell::Sfr(address - sfr_start)
        } else {
            let bank = usize::from(self.sfr_at(XBNK)) % XRAM_BANKS;
            Cell::Xram {
                bank,
                offset: address - xram_start,
            }
        }
    }

    fn sfr_at(&self, address: u16) -> u8 {
        self.sfr[usize::from(address - SFR_START)]
    }

    /// Stores the live value of a timer counter.
    ///
    /// Semantic reads of `address` return it until the latch is dropped by
    /// [`Ram::reset_registers`].
    pub fn latch_counter(&mut self, address: u16, value: u8) {
        debug_assert!((SFR_START..XRAM_START).contains(&address));
        self.counter_latches[usize::from(address - SFR_START)] = Some(value);
    }

    #[must_use]
    pub fn counter_latch(&self, address: u16) -> Option<u8> {
        self.counter_latches[usize::from(address - SFR_START)]
    }

    /// Stack accesses always land in main RAM bank 0.
    #[must_use]
    pub const fn read_stack(&self, sp: u8) -> u8 {
        self.main[0][sp as usize]
    }

    pub const fn write_stack(&mut self, sp: u8, value: u8) {
        self.main[0][sp as usize] = value;
    }

    /// Clears every SFR and counter latch; main RAM and XRAM keep their contents.
    pub fn reset_registers(&mut self) {
        self.sfr = [0; SFR_SIZE];
        self.counter_latches = [None; SFR_SIZE];
    }
}

impl MemoryRegion for Ram {
    fn len(&self) -> usize {
        RAM_SIZE
    }

    fn read_byte(&self, address: usize) -> u8 {
        match self.locate(address) {
            Cell::Sfr(offset) => self.counter_latches[offset].unwrap_or(self.sfr[offset]),
            _ => self.read_raw(address),
        }
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        self.write_raw(address, value);
    }

    fn read_raw(&self, address: usize) -> u8 {
        match self.locate(address) {
            Cell::Main { bank, offset } => self.main[bank][offset],
            Cell::Sfr(offset) => self.sfr[offset],
            Cell::Xram { bank, offset } => self.xram[bank][offset],
        }
    }

    fn write_raw(&mut self, address: usize, value: u8) {
        match self.locate(address) {
            Cell::Main { bank, offset } => self.main[bank][offset] = value,
            Cell::Sfr(offset) => self.sfr[offset] = value,
            Cell::Xram { bank, offset } => self.xram[bank][offset] = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::memory::sfr::{ACC, T1L};

    #[test]
    fn main_ram_follows_psw_bank() {
        let mut ram = Ram::new();
        ram.write_byte(0x10, 0xAA);

        ram.write_byte(usize::from(PSW), 0b0000_0010);
        assert_eq!(ram.read_byte(0x10), 0);
        ram.write_byte(0x10, 0x55);

        ram.write_byte(usize::from(PSW), 0);
        assert_eq!(ram.read_byte(0x10), 0xAA);
        assert_eq!(ram.main[1][0x10], 0x55);
    }

    #[test]
    fn xram_follows_xbnk() {
        let mut ram = Ram::new();
        ram.write_byte(usize::from(XBNK), 2);
        ram.write_byte(0x1FF, 7);

        assert_eq!(ram.xram[2][0x7F], 7);
        ram.write_byte(usize::from(XBNK), 0);
        assert_eq!(ram.read_byte(0x1FF), 0);
    }

    #[test]
    fn addresses_wrap_at_512() {
        let mut ram = Ram::new();
        ram.write_byte(0x200 + usize::from(ACC), 3);
        assert_eq!(ram.read_byte(usize::from(ACC)), 3);
    }

    #[test]
    fn counter_latch_only_affects_semantic_reads() {
        let mut ram = Ram::new();
        ram.write_byte(usize::from(T1L), 0xF0);
        ram.latch_counter(T1L, 0xF3);

        assert_eq!(ram.read_byte(usize::from(T1L)), 0xF3);
        assert_eq!(ram.read_raw(usize::from(T1L)), 0xF0);

        ram.reset_registers();
        assert_eq!(ram.read_byte(usize::from(T1L)), 0);
        assert_eq!(ram.counter_latch(T1L), None);
    }

    #[test]
    fn stack_ignores_ram_bank() {
        let mut ram = Ram::new();
        ram.write_byte(usize::from(PSW), 0b0000_0010);
        ram.write_stack(0x80, 9);

        assert_eq!(ram.read_byte(0x80), 0);
        ram.write_byte(usize::from(PSW), 0);
        assert_eq!(ram.read_byte(0x80), 9);
    }

    #[test]
    fn bulk_access_is_raw() {
        let mut ram = Ram::new();
        ram.write(&[1, 2, 3], usize::from(T1L) - 1);
        ram.latch_counter(T1L, 0x99);

        assert_eq!(ram.read(usize::from(T1L) - 1, 3), vec![1, 2, 3]);
    }
}
