//! Special function register addresses (0x100-0x17F of the RAM space).

/// Accumulator.
pub const ACC: u16 = 0x100;
/// Program status word, see [`Psw`](crate::cpu::psw::Psw).
pub const PSW: u16 = 0x101;
/// B register (`MUL`/`DIV` operand and result).
pub const B: u16 = 0x102;
/// C register (`MUL`/`DIV` low byte).
pub const C: u16 = 0x103;
/// Table reference register, low byte (`LDC`, `LDF`, `STF`).
pub const TRL: u16 = 0x104;
/// Table reference register, high byte.
pub const TRH: u16 = 0x105;
/// Stack pointer.
pub const SP: u16 = 0x106;
/// Power control, bit 0 is HALT.
pub const PCON: u16 = 0x107;
/// Interrupt enable, bit 7 is the master enable.
pub const IE: u16 = 0x108;
/// Interrupt priority control.
pub const IP: u16 = 0x109;
/// External memory control, bit 0 selects Flash (1) or ROM (0).
pub const EXT: u16 = 0x10D;
/// Oscillation control.
pub const OCR: u16 = 0x10E;

/// Timer 0 control.
pub const T0CON: u16 = 0x110;
/// Timer 0 prescaler reload.
pub const T0PRR: u16 = 0x111;
/// Timer 0 low counter.
pub const T0L: u16 = 0x112;
/// Timer 0 low reload.
pub const T0LR: u16 = 0x113;
/// Timer 0 high counter.
pub const T0H: u16 = 0x114;
/// Timer 0 high reload.
pub const T0HR: u16 = 0x115;

/// Timer 1 control.
pub const T1CNT: u16 = 0x118;
/// Timer 1 low compare.
pub const T1LC: u16 = 0x11A;
/// Timer 1 low counter (read) and reload (write).
pub const T1L: u16 = 0x11B;
pub const T1LR: u16 = T1L;
/// Timer 1 high compare.
pub const T1HC: u16 = 0x11C;
/// Timer 1 high counter (read) and reload (write).
pub const T1H: u16 = 0x11D;
pub const T1HR: u16 = T1H;

/// XRAM bank select.
pub const XBNK: u16 = 0x125;
/// Flash program register, bit 0 selects the flash bank for `LDF`/`STF`.
pub const FPR: u16 = 0x154;

/// First address of the SFR area.
pub const SFR_START: u16 = 0x100;
/// First address of the XRAM window.
pub const XRAM_START: u16 = 0x180;
