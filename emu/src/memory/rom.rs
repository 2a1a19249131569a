use serde::{Deserialize, Serialize};

use crate::error::{EmuError, Result};
use crate::memory::{MemoryRegion, wrap_address};

/// The LC86K can address 64K of program ROM.
pub const ROM_SIZE: usize = 0x1_0000;

/// BIOS ROM. Firmware cannot write to it; loaders use the raw accessors.
#[derive(Default, Serialize, Deserialize)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Wraps a BIOS image, rejecting images that do not fit the 64K window.
    pub fn new(image: Vec<u8>) -> Result<Self> {
        if image.len() > ROM_SIZE {
            return Err(EmuError::ImageTooLarge {
                region: "ROM",
                len: image.len(),
                max: ROM_SIZE,
            });
        }

        Ok(Self { data: image })
    }

    /// An empty ROM, for machines that boot through HLE.
    #[must_use]
    pub const fn empty() -> Self {
        Self { data: Vec::new() }
    }
}

impl MemoryRegion for Rom {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_byte(&self, address: usize) -> u8 {
        // An absent BIOS reads as an open bus.
        self.data
            .get(wrap_address(address, self.data.len()))
            .copied()
            .unwrap_or(0xFF)
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        tracing::warn!("ignoring write of {value:02X} to ROM address {address:04X}");
    }

    fn write_raw(&mut self, address: usize, value: u8) {
        let address = wrap_address(address, self.data.len());
        if let Some(byte) = self.data.get_mut(address) {
            *byte = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejects_oversize_image() {
        let err = Rom::new(vec![0; ROM_SIZE + 1]).err();
        assert_eq!(
            err,
            Some(EmuError::ImageTooLarge {
                region: "ROM",
                len: ROM_SIZE + 1,
                max: ROM_SIZE,
            })
        );
    }

    #[test]
    fn firmware_writes_are_ignored() {
        let mut rom = Rom::new(vec![1, 2, 3, 4]).unwrap();
        rom.write_byte(1, 0xEE);
        assert_eq!(rom.read_byte(1), 2);

        rom.write_raw(1, 0xEE);
        assert_eq!(rom.read_byte(1), 0xEE);
    }

    #[test]
    fn reads_wrap_around_image() {
        let rom = Rom::new(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(rom.read_byte(5), 2);
        assert_eq!(Rom::empty().read_byte(0x100), 0xFF);
    }
}
