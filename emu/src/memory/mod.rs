//! # Memory regions
//!
//! The LC86K sees three byte stores:
//!
//! | Region  | Size        | Notes                                              |
//! |---------|-------------|----------------------------------------------------|
//! | RAM     | 0x200       | main RAM (2 banks), SFRs, XRAM (3 banks)           |
//! | ROM     | up to 64K   | BIOS, read-only for firmware                       |
//! | Flash   | up to 128K  | user programs and save data, 2 banks of 64K        |
//!
//! None of the regions has a fault path: every access is masked to the region
//! size (hardware wraparound) before it reaches the backing store.
//!
//! Regions are shared between the CPU and the peripherals through [`Shared`]
//! handles handed out at construction time.

use std::cell::RefCell;
use std::rc::Rc;

pub mod flash;
pub mod ram;
pub mod rom;
pub mod sfr;

/// Single-threaded shared ownership for collaborators that several
/// components read and write (memory, interrupt flags, audio).
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// An addressable byte store.
///
/// `read_byte`/`write_byte` are the semantic accessors and may apply side
/// effects such as bank selection or counter latches; `read_raw`/`write_raw`
/// bypass them. Peripherals use the raw accessors so they never re-trigger
/// their own latches.
pub trait MemoryRegion {
    /// Number of addressable bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_byte(&self, address: usize) -> u8;

    fn write_byte(&mut self, address: usize, value: u8);

    fn read_raw(&self, address: usize) -> u8 {
        self.read_byte(address)
    }

    fn write_raw(&mut self, address: usize, value: u8) {
        self.write_byte(address, value);
    }

    /// Raw bulk read of `count` bytes starting at `address`, wrapping at the end.
    fn read(&self, address: usize, count: usize) -> Vec<u8> {
        (0..count)
            .map(|offset| self.read_raw(address.wrapping_add(offset)))
            .collect()
    }

    /// Raw bulk write of `data` starting at `address`, wrapping at the end.
    fn write(&mut self, data: &[u8], address: usize) {
        for (offset, value) in data.iter().enumerate() {
            self.write_raw(address.wrapping_add(offset), *value);
        }
    }
}

/// Folds an address into a region of `len` bytes.
pub(crate) const fn wrap_address(address: usize, len: usize) -> usize {
    if len == 0 { 0 } else { address % len }
}
