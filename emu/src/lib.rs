#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod cpu;
pub mod error;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub mod vmu;
