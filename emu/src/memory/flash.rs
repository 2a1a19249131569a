use serde::{Deserialize, Serialize};

use crate::error::{EmuError, Result};
use crate::memory::{MemoryRegion, wrap_address};

/// Two 64K banks.
pub const FLASH_SIZE: usize = 0x2_0000;
pub const FLASH_BANK_SIZE: usize = 0x1_0000;

/// Flash memory holding the user program (bank 0) and save data.
///
/// Instruction fetch through `EXT` only sees bank 0; `LDF`/`STF` reach both
/// banks with a 17-bit address.
#[derive(Serialize, Deserialize)]
pub struct Flash {
    data: Vec<u8>,
}

impl Default for Flash {
    fn default() -> Self {
        Self {
            data: vec![0; FLASH_SIZE],
        }
    }
}

impl Flash {
    /// Loads an image at offset 0; the rest of the chip stays erased (zero).
    pub fn new(image: &[u8]) -> Result<Self> {
        if image.len() > FLASH_SIZE {
            return Err(EmuError::ImageTooLarge {
                region: "Flash",
                len: image.len(),
                max: FLASH_SIZE,
            });
        }

        let mut flash = Self::default();
        flash.data[..image.len()].copy_from_slice(image);
        Ok(flash)
    }

    /// Reads from `bank` (0 or 1) at a 16-bit offset.
    #[must_use]
    pub fn read_banked(&self, bank: u8, offset: u16) -> u8 {
        self.read_byte(Self::banked_address(bank, offset))
    }

    pub fn write_banked(&mut self, bank: u8, offset: u16, value: u8) {
        self.write_byte(Self::banked_address(bank, offset), value);
    }

    fn banked_address(bank: u8, offset: u16) -> usize {
        usize::from(bank & 1) * FLASH_BANK_SIZE + usize::from(offset)
    }
}

impl MemoryRegion for Flash {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_byte(&self, address: usize) -> u8 {
        self.data[wrap_address(address, self.data.len())]
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        let address = wrap_address(address, self.data.len());
        self.data[address] = value;
    }
}
