pub mod interrupt_control;
pub mod sound;

#[allow(clippy::cast_possible_truncation)]
pub mod timers;
