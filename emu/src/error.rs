use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmuError>;

/// Errors raised while assembling a machine. Once constructed, nothing in the
/// core can fail: memory accesses wrap and every opcode byte decodes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmuError {
    #[error("{region} image is {len} bytes, larger than the {max} bytes the region can hold")]
    ImageTooLarge {
        region: &'static str,
        len: usize,
        max: usize,
    },

    #[error("a BIOS image is required unless the CPU boots through HLE")]
    MissingBios,

    #[error("HLE boot needs a flash image to start from")]
    MissingFlash,
}
