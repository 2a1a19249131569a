//! Interrupt acceptance and dispatch.
//!
//! Each poll moves every pending, enabled source into a FIFO queue (clearing
//! its flag in the controller) and then enters at most one service routine:
//! the oldest queued source whose level is above the level currently being
//! serviced and that `IE` still allows. Masked entries stay queued. Entering pushes the return address like `CALL`; `RETI` pops it
//! and restores the previous level.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::hardware::interrupt_control::{InterruptLevel, InterruptSource};
use crate::cpu::lc86k::Lc86k;
use crate::cpu::psw::Psw;
use crate::memory::sfr::{IE, PCON};

/// Typed view of `IE`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEnable(u8);

impl InterruptEnable {
    /// IE7 => Bit 7, gates every maskable source.
    #[must_use]
    pub fn master(self) -> bool {
        self.0.get_bit(7)
    }

    /// Whether `source` may be accepted under this mask.
    #[must_use]
    pub fn allows(self, source: InterruptSource) -> bool {
        !source.is_maskable() || self.master()
    }
}

impl From<u8> for InterruptEnable {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// A service routine in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicedInterrupt {
    pub source: InterruptSource,
    pub return_pc: u16,
    /// PSW when the routine was entered.
    pub psw: Psw,
    pub previous_level: InterruptLevel,
}

impl Lc86k {
    /// Accepts newly raised interrupts and dispatches at most one.
    ///
    /// Returns the source whose service routine was entered, if any.
    pub fn process_interrupts(&mut self) -> Option<InterruptSource> {
        self.accept_interrupts();

        let enable = InterruptEnable::from(self.register(IE));
        let index = self
            .interrupt_queue
            .iter()
            .position(|source| enable.allows(*source) && source.level() > self.interrupt_level)?;
        let source = self.interrupt_queue.remove(index)?;

        if source == InterruptSource::Reset {
            tracing::debug!("reset requested");
            self.reset();
        } else {
            self.enter_interrupt(source);
        }

        Some(source)
    }

    fn accept_interrupts(&mut self) {
        let enable = InterruptEnable::from(self.register(IE));
        let mut interrupts = self.interrupts.borrow_mut();

        for source in InterruptSource::PRIORITY {
            if !interrupts.is_pending(source) || !enable.allows(source) {
                continue;
            }

            let queued = self.interrupt_queue.contains(&source);
            let in_service = self.servicing.iter().any(|s| s.source == source);
            if queued || in_service {
                continue;
            }

            interrupts.clear(source);
            self.interrupt_queue.push_back(source);
        }
    }

    fn enter_interrupt(&mut self, source: InterruptSource) {
        let return_pc = self.pc;
        self.push_address(return_pc);

        self.servicing.push(ServicedInterrupt {
            source,
            return_pc,
            psw: self.psw(),
            previous_level: self.interrupt_level,
        });
        self.interrupt_level = source.level();

        let mut pcon = self.register(PCON);
        pcon.set_bit(0, false);
        self.set_register(PCON, pcon);

        self.pc = source.vector();
        tracing::debug!(
            "entering {source:?} at {:04X}, return to {return_pc:04X}",
            self.pc
        );
    }

    /// `RETI`
    pub(crate) fn return_from_interrupt(&mut self) {
        self.pc = self.pop_address();

        match self.servicing.pop() {
            Some(serviced) => {
                self.interrupt_level = serviced.previous_level;
                tracing::debug!("leaving {:?}", serviced.source);
            }
            None => self.interrupt_level = InterruptLevel::None,
        }
    }

    /// Service routines currently entered, outermost first.
    #[must_use]
    pub fn serviced_interrupts(&self) -> &[ServicedInterrupt] {
        &self.servicing
    }

    #[must_use]
    pub const fn interrupt_level(&self) -> InterruptLevel {
        self.interrupt_level
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::memory::sfr::SP;

    fn raise(cpu: &Lc86k, source: InterruptSource) {
        cpu.interrupts.borrow_mut().set(source);
    }

    fn enabled_cpu() -> Lc86k {
        let mut cpu = Lc86k::with_rom(&[0x00; 16]);
        cpu.set_register(IE, 0x80);
        cpu
    }

    #[test]
    fn masked_sources_stay_pending() {
        let mut cpu = Lc86k::with_rom(&[]);
        raise(&cpu, InterruptSource::T1Hlov);

        assert_eq!(cpu.process_interrupts(), None);
        assert_eq!(cpu.interrupts.borrow().get(InterruptSource::T1Hlov), 1);
    }

    #[test]
    fn dispatch_pushes_return_address_and_vectors() {
        let mut cpu = enabled_cpu();
        cpu.set_program_counter(0x1234);
        raise(&cpu, InterruptSource::T1Hlov);

        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::T1Hlov));
        assert_eq!(cpu.program_counter(), 0x02B);
        assert_eq!(cpu.interrupt_level(), InterruptLevel::Low);
        assert_eq!(cpu.interrupts.borrow().get(InterruptSource::T1Hlov), 0);
        assert_eq!(cpu.read_from_ram(0x80, 2), vec![0x34, 0x12]);
        assert_eq!(cpu.register(SP), 0x81);
    }

    #[test]
    fn reti_restores_pc_and_level() {
        // RETI at the T1HLOV vector.
        let mut cpu = enabled_cpu();
        cpu.write_to_rom(&[0xB0], 0x02B);
        cpu.set_program_counter(0x0010);
        raise(&cpu, InterruptSource::T1Hlov);
        cpu.process_interrupts();

        cpu.process_instruction(false);
        assert_eq!(cpu.program_counter(), 0x0010);
        assert_eq!(cpu.interrupt_level(), InterruptLevel::None);
        assert!(cpu.serviced_interrupts().is_empty());
    }

    #[test]
    fn one_dispatch_per_poll_in_priority_order() {
        let mut cpu = enabled_cpu();
        raise(&cpu, InterruptSource::P3);
        raise(&cpu, InterruptSource::Int2);

        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::Int2));
        // Same level as the routine running, so P3 waits in the queue.
        assert_eq!(cpu.process_interrupts(), None);
        assert_eq!(cpu.interrupt_queue.len(), 1);

        cpu.return_from_interrupt();
        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::P3));
    }

    #[test]
    fn queued_source_waits_while_masked() {
        let mut cpu = enabled_cpu();
        raise(&cpu, InterruptSource::Int2);
        raise(&cpu, InterruptSource::P3);
        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::Int2));
        assert_eq!(cpu.interrupt_queue.len(), 1);

        cpu.set_register(IE, 0x00);
        cpu.return_from_interrupt();
        let pc = cpu.program_counter();
        assert_eq!(cpu.process_interrupts(), None);
        assert_eq!(cpu.program_counter(), pc);
        assert_eq!(cpu.interrupt_queue.len(), 1);

        cpu.set_register(IE, 0x80);
        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::P3));
        assert_eq!(cpu.program_counter(), InterruptSource::P3.vector());
    }

    #[test]
    fn high_level_preempts_low() {
        let mut cpu = enabled_cpu();
        raise(&cpu, InterruptSource::T0Hov);
        cpu.process_interrupts();

        raise(&cpu, InterruptSource::Int1);
        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::Int1));
        assert_eq!(cpu.serviced_interrupts().len(), 2);
        assert_eq!(
            cpu.serviced_interrupts()[1].previous_level,
            InterruptLevel::Low
        );
    }

    #[test]
    fn source_in_service_is_not_accepted_again() {
        let mut cpu = enabled_cpu();
        raise(&cpu, InterruptSource::Int0);
        cpu.process_interrupts();

        raise(&cpu, InterruptSource::Int0);
        assert_eq!(cpu.process_interrupts(), None);
        assert_eq!(cpu.interrupts.borrow().get(InterruptSource::Int0), 1);
        assert!(cpu.interrupt_queue.is_empty());
    }

    #[test]
    fn dispatch_wakes_from_halt() {
        let mut cpu = enabled_cpu();
        cpu.set_register(PCON, 0x01);
        raise(&cpu, InterruptSource::Int3);

        cpu.process_interrupts();
        assert!(!cpu.is_halted());
    }

    #[test]
    fn reset_ignores_mask_and_resets() {
        let mut cpu = Lc86k::with_rom(&[0x00; 4]);
        cpu.run(3);
        raise(&cpu, InterruptSource::Reset);

        assert_eq!(cpu.process_interrupts(), Some(InterruptSource::Reset));
        assert_eq!(cpu.program_counter(), 0);
        assert_eq!(cpu.interrupts.borrow().get(InterruptSource::Reset), 0);
    }
}
