mod addressing;
pub mod bank;

#[allow(clippy::cast_possible_truncation)]
pub mod hardware;
pub mod instruction;
pub mod interrupts;

#[allow(clippy::cast_lossless)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::module_name_repetitions)]
pub mod lc86k;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod operations;

#[allow(clippy::cast_possible_truncation)]
pub mod psw;
