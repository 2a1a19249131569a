use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::bank::{Bank, BankLatch};
use crate::cpu::hardware::interrupt_control::{InterruptController, InterruptLevel, InterruptSource};
use crate::cpu::instruction::Opcode;
use crate::cpu::interrupts::ServicedInterrupt;
use crate::cpu::psw::{Flag, Psw};
use crate::error::{EmuError, Result};
use crate::memory::flash::Flash;
use crate::memory::ram::Ram;
use crate::memory::rom::Rom;
use crate::memory::sfr::{ACC, EXT, PCON, PSW, SP};
use crate::memory::{MemoryRegion, Shared};

/// Main clock of a VMU running from its RC oscillator, in Hz.
pub const DEFAULT_FREQUENCY: f64 = 879_236.0;

/// Stack pointer value after reset.
pub const SP_RESET: u8 = 0x7F;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Stopped,
    Started,
}

/// Outcome of [`Lc86k::process_instruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed { cycles: u8 },
    /// `PCON.HALT` is set; nothing was fetched.
    Halted,
}

impl Step {
    /// Cycles the driving loop should advance the peripherals by.
    #[must_use]
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Executed { cycles } => cycles,
            Self::Halted => 1,
        }
    }
}

pub struct Lc86k {
    pub(crate) ram: Shared<Ram>,
    pub(crate) rom: Shared<Rom>,
    pub(crate) flash: Shared<Flash>,
    pub(crate) interrupts: Shared<InterruptController>,

    pub(crate) pc: u16,
    pub(crate) ext: BankLatch,
    state: RunState,
    frequency: f64,

    pub(crate) interrupt_level: InterruptLevel,
    pub(crate) servicing: Vec<ServicedInterrupt>,
    pub(crate) interrupt_queue: VecDeque<InterruptSource>,

    instruction_count: u64,
    hle: bool,
}

impl Lc86k {
    /// Builds a CPU in its cold reset state.
    ///
    /// Without HLE the CPU boots from ROM, so a BIOS image is required.
    pub fn new(
        ram: Shared<Ram>,
        rom: Shared<Rom>,
        flash: Shared<Flash>,
        interrupts: Shared<InterruptController>,
        hle: bool,
    ) -> Result<Self> {
        if !hle && rom.borrow().is_empty() {
            return Err(EmuError::MissingBios);
        }

        let mut cpu = Self {
            ram,
            rom,
            flash,
            interrupts,
            pc: 0,
            ext: BankLatch::default(),
            state: RunState::Stopped,
            frequency: DEFAULT_FREQUENCY,
            interrupt_level: InterruptLevel::None,
            servicing: Vec::new(),
            interrupt_queue: VecDeque::new(),
            instruction_count: 0,
            hle,
        };
        cpu.reset();

        Ok(cpu)
    }

    /// Cold reset. RAM contents survive, registers and interrupt state do not.
    pub fn reset(&mut self) {
        let bank = if self.hle { Bank::Flash } else { Bank::Rom };

        {
            let mut ram = self.ram.borrow_mut();
            ram.reset_registers();
            ram.write_byte(usize::from(SP), SP_RESET);
            ram.write_byte(usize::from(EXT), u8::from(bank));
        }
        self.interrupts.borrow_mut().clear_all();

        self.pc = 0;
        self.ext = BankLatch::new(bank);
        self.state = RunState::Stopped;
        self.interrupt_level = InterruptLevel::None;
        self.servicing.clear();
        self.interrupt_queue.clear();
        self.instruction_count = 0;
    }

    /// Skips the BIOS: cold reset, then jump straight to `entry`.
    pub fn perform_hle(&mut self, entry: u16) {
        self.reset();
        self.pc = entry;
        tracing::info!("HLE boot at {entry:04X} from {:?}", self.ext.current());
    }

    #[must_use]
    pub const fn frequency(&self) -> f64 {
        self.frequency
    }

    pub const fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    #[must_use]
    pub const fn program_counter(&self) -> u16 {
        self.pc
    }

    pub const fn set_program_counter(&mut self, pc: u16) {
        self.pc = pc;
    }

    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub const fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Program bank used by the instruction in flight.
    #[must_use]
    pub const fn bank(&self) -> Bank {
        self.ext.current()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.register(PCON).get_bit(0)
    }

    pub fn fetch(&mut self) -> u8 {
        let op_code = self.read_byte_rf(self.pc);
        self.pc = self.pc.wrapping_add(1);
        op_code
    }

    pub fn decode(&self, op_code: u8, debug: bool) -> Opcode {
        let opcode = Opcode::from(op_code);
        if debug {
            tracing::debug!(
                "{:?} {:04X}: {opcode}",
                self.ext.current(),
                self.pc.wrapping_sub(1)
            );
        }
        opcode
    }

    /// Runs one instruction from the bank `EXT` selected before it.
    pub fn process_instruction(&mut self, debug: bool) -> Step {
        self.state = RunState::Started;

        if self.is_halted() {
            return Step::Halted;
        }

        if self.ext.commit() {
            tracing::debug!("fetching from {:?}", self.ext.current());
        }

        let op_code = self.fetch();
        let opcode = self.decode(op_code, debug);
        self.execute(opcode);
        self.instruction_count += 1;

        let ext = Bank::from(self.ram.borrow().read_raw(usize::from(EXT)));
        self.ext.latch(ext);

        Step::Executed {
            cycles: opcode.instruction.cycles(),
        }
    }

    /// Reads program memory from ROM or Flash bank 0, depending on `EXT`.
    #[must_use]
    pub fn read_byte_rf(&self, address: u16) -> u8 {
        self.read_byte_in(self.ext.current(), address)
    }

    pub(crate) fn read_byte_in(&self, bank: Bank, address: u16) -> u8 {
        match bank {
            Bank::Rom => self.rom.borrow().read_byte(usize::from(address)),
            Bank::Flash => self.flash.borrow().read_banked(0, address),
        }
    }

    pub fn write_byte_rf(&mut self, address: u16, value: u8) {
        match self.ext.current() {
            Bank::Rom => self.rom.borrow_mut().write_byte(usize::from(address), value),
            Bank::Flash => self.flash.borrow_mut().write_banked(0, address, value),
        }
    }

    #[must_use]
    pub fn read_from_rom(&self, address: usize, count: usize) -> Vec<u8> {
        self.rom.borrow().read(address, count)
    }

    #[must_use]
    pub fn read_from_ram(&self, address: usize, count: usize) -> Vec<u8> {
        self.ram.borrow().read(address, count)
    }

    pub fn write_to_rom(&mut self, data: &[u8], address: usize) {
        self.rom.borrow_mut().write(data, address);
    }

    pub fn write_to_ram(&mut self, data: &[u8], address: usize) {
        self.ram.borrow_mut().write(data, address);
    }

    /// Semantic RAM read, as an instruction sees it.
    #[must_use]
    pub fn register(&self, address: u16) -> u8 {
        self.ram.borrow().read_byte(usize::from(address))
    }

    pub fn set_register(&mut self, address: u16, value: u8) {
        self.ram.borrow_mut().write_byte(usize::from(address), value);
    }

    #[must_use]
    pub fn accumulator(&self) -> u8 {
        self.register(ACC)
    }

    pub fn set_accumulator(&mut self, value: u8) {
        self.set_register(ACC, value);
    }

    #[must_use]
    pub fn psw(&self) -> Psw {
        Psw::from(self.register(PSW))
    }

    pub fn set_psw(&mut self, psw: Psw) {
        self.set_register(PSW, u8::from(psw));
    }

    pub fn set_flag(&mut self, flag: Flag) {
        let mut psw = self.psw();
        psw.set_flag(flag, true);
        self.set_psw(psw);
    }

    pub fn clear_flag(&mut self, flag: Flag) {
        let mut psw = self.psw();
        psw.set_flag(flag, false);
        self.set_psw(psw);
    }

    /// 1 when `flag` is set, 0 otherwise.
    #[must_use]
    pub fn get_flag(&self, flag: Flag) -> u8 {
        u8::from(self.psw().flag(flag))
    }

    pub(crate) fn write_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.set_flag(flag);
        } else {
            self.clear_flag(flag);
        }
    }

    /// `SP` is pre-incremented; the stack lives in main RAM bank 0.
    pub(crate) fn push(&mut self, value: u8) {
        let mut ram = self.ram.borrow_mut();
        let sp = ram.read_raw(usize::from(SP)).wrapping_add(1);
        ram.write_stack(sp, value);
        ram.write_raw(usize::from(SP), sp);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        let mut ram = self.ram.borrow_mut();
        let sp = ram.read_raw(usize::from(SP));
        let value = ram.read_stack(sp);
        ram.write_raw(usize::from(SP), sp.wrapping_sub(1));
        value
    }

    /// Pushes a return address, low byte first.
    pub(crate) fn push_address(&mut self, address: u16) {
        let [low, high] = address.to_le_bytes();
        self.push(low);
        self.push(high);
    }

    pub(crate) fn pop_address(&mut self) -> u16 {
        let high = self.pop();
        let low = self.pop();
        u16::from_le_bytes([low, high])
    }
}

#[cfg(test)]
impl Lc86k {
    /// A CPU booting from a ROM that starts with `program`.
    pub(crate) fn with_rom(program: &[u8]) -> Self {
        use crate::memory::rom::ROM_SIZE;
        use crate::memory::shared;

        let mut image = vec![0; ROM_SIZE];
        image[..program.len()].copy_from_slice(program);

        Self::new(
            shared(Ram::new()),
            shared(Rom::new(image).unwrap()),
            shared(Flash::default()),
            shared(InterruptController::new()),
            false,
        )
        .unwrap()
    }

    /// Runs `count` instructions and returns the cycles they took.
    pub(crate) fn run(&mut self, count: usize) -> u32 {
        (0..count)
            .map(|_| u32::from(self.process_instruction(false).cycles()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::memory::shared;
    use crate::memory::sfr::IE;

    #[test]
    fn flag_set_clear_get() {
        for flag in Flag::ALL {
            let mut cpu = Lc86k::with_rom(&[]);
            let before: u8 = rand::random();
            cpu.set_register(PSW, before);

            cpu.set_flag(flag);
            assert_eq!(cpu.get_flag(flag), 1);
            cpu.clear_flag(flag);
            assert_eq!(cpu.get_flag(flag), 0);

            for other in Flag::ALL.into_iter().filter(|f| *f != flag) {
                assert_eq!(cpu.psw().flag(other), Psw::from(before).flag(other));
            }
        }
    }

    #[test]
    fn missing_bios_without_hle() {
        let result = Lc86k::new(
            shared(Ram::new()),
            shared(Rom::empty()),
            shared(Flash::default()),
            shared(InterruptController::new()),
            false,
        );
        assert_eq!(result.err(), Some(EmuError::MissingBios));
    }

    #[test]
    fn cold_reset_state() {
        let cpu = Lc86k::with_rom(&[]);
        assert_eq!(cpu.program_counter(), 0);
        assert_eq!(cpu.register(SP), SP_RESET);
        assert_eq!(cpu.bank(), Bank::Rom);
        assert_eq!(cpu.run_state(), RunState::Stopped);
    }

    #[test]
    fn first_instruction_starts_the_cpu() {
        let mut cpu = Lc86k::with_rom(&[0x00]);
        assert_eq!(cpu.process_instruction(false), Step::Executed { cycles: 1 });
        assert_eq!(cpu.run_state(), RunState::Started);
        assert_eq!(cpu.program_counter(), 1);
        assert_eq!(cpu.instruction_count(), 1);
    }

    #[test]
    fn ext_switch_applies_from_next_fetch() {
        // MOV #1, EXT ; JMPF 0x0200
        let mut cpu = Lc86k::with_rom(&[0x23, 0x0D, 0x01, 0x21, 0x02, 0x00]);
        // The flash copy of the jump has a different target.
        cpu.flash.borrow_mut().write(&[0x00, 0x00, 0x00, 0x21, 0x03, 0x00], 0);

        cpu.process_instruction(false);
        assert_eq!(cpu.bank(), Bank::Rom);
        assert_eq!(cpu.ext.latest(), Bank::Flash);

        cpu.process_instruction(false);
        assert_eq!(cpu.bank(), Bank::Flash);
        assert_eq!(cpu.program_counter(), 0x0300);
    }

    #[test]
    fn writing_instruction_reads_operands_from_old_bank() {
        // MOV #1, EXT ; MOV #0x55, ACC
        let mut cpu = Lc86k::with_rom(&[0x23, 0x0D, 0x01, 0x23, 0x00, 0x55]);
        // Same offsets in flash: MOV #0, T1LR ; MOV #0xAA, ACC
        cpu.flash
            .borrow_mut()
            .write(&[0x23, 0x1B, 0x00, 0x23, 0x00, 0xAA], 0);

        cpu.process_instruction(false);
        assert_eq!(cpu.program_counter(), 3);
        assert_eq!(cpu.register(EXT), 0x01);
        assert_eq!(cpu.ext.latest(), Bank::Flash);
        assert_eq!(cpu.bank(), Bank::Rom);

        cpu.process_instruction(false);
        assert_eq!(cpu.bank(), Bank::Flash);
        assert_eq!(cpu.accumulator(), 0xAA);
    }

    #[test]
    fn hle_is_reset_then_jump() {
        let mut hle = Lc86k::with_rom(&[0x00, 0x00]);
        hle.set_register(IE, 0x80);
        hle.run(2);
        hle.perform_hle(0x1234);

        let mut reset = Lc86k::with_rom(&[0x00, 0x00]);
        reset.set_register(IE, 0x80);
        reset.run(2);
        reset.reset();
        reset.set_program_counter(0x1234);

        assert_eq!(hle.program_counter(), reset.program_counter());
        assert_eq!(hle.bank(), reset.bank());
        assert_eq!(hle.run_state(), reset.run_state());
        assert_eq!(
            hle.read_from_ram(0x100, 0x80),
            reset.read_from_ram(0x100, 0x80)
        );
    }

    #[test]
    fn halted_cpu_does_not_fetch() {
        let mut cpu = Lc86k::with_rom(&[0x00]);
        cpu.set_register(PCON, 0x01);

        assert_eq!(cpu.process_instruction(false), Step::Halted);
        assert_eq!(Step::Halted.cycles(), 1);
        assert_eq!(cpu.program_counter(), 0);
    }

    #[test]
    fn stack_push_pop() {
        let mut cpu = Lc86k::with_rom(&[]);
        cpu.push_address(0xBEEF);
        assert_eq!(cpu.register(SP), SP_RESET + 2);
        assert_eq!(cpu.read_from_ram(0x80, 2), vec![0xEF, 0xBE]);

        assert_eq!(cpu.pop_address(), 0xBEEF);
        assert_eq!(cpu.register(SP), SP_RESET);
    }

    #[test]
    fn rom_writes_through_ext_are_ignored() {
        let mut cpu = Lc86k::with_rom(&[0x55]);
        cpu.write_byte_rf(0, 0xAA);
        assert_eq!(cpu.read_byte_rf(0), 0x55);

        cpu.write_to_rom(&[0xAA], 0);
        assert_eq!(cpu.read_from_rom(0, 1), vec![0xAA]);
    }
}
