use serde::{Deserialize, Serialize};

use crate::cpu::hardware::interrupt_control::InterruptController;
use crate::cpu::hardware::sound::{AudioSink, Buzzer};
use crate::cpu::hardware::timers::Timer;
use crate::cpu::lc86k::{DEFAULT_FREQUENCY, Lc86k};
use crate::error::{EmuError, Result};
use crate::memory::flash::Flash;
use crate::memory::ram::Ram;
use crate::memory::rom::Rom;
use crate::memory::{Shared, shared};

/// Start-up options of a [`Vmu`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmuConfig {
    /// CPU clock in Hz.
    pub frequency: f64,
    /// Skip the BIOS and jump straight into the flash program.
    pub hle: bool,
    /// Where the flash program starts when booting through HLE.
    pub hle_entry: u16,
}

impl Default for VmuConfig {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            hle: false,
            hle_entry: 0,
        }
    }
}

/// A Visual Memory Unit: the CPU and the peripherals that share its memory.
pub struct Vmu {
    pub cpu: Lc86k,
    pub timer0: Timer,
    pub timer1: Timer,

    pub ram: Shared<Ram>,
    pub flash: Shared<Flash>,
    pub interrupts: Shared<InterruptController>,
    pub buzzer: Shared<Buzzer>,

    debug: bool,
}

impl Vmu {
    pub fn new(bios: Vec<u8>, flash: &[u8], config: VmuConfig) -> Result<Self> {
        if config.hle && flash.is_empty() {
            return Err(EmuError::MissingFlash);
        }

        let ram = shared(Ram::new());
        let rom = shared(Rom::new(bios)?);
        let flash = shared(Flash::new(flash)?);
        let interrupts = shared(InterruptController::new());
        let buzzer = shared(Buzzer::default());

        let mut cpu = Lc86k::new(
            ram.clone(),
            rom,
            flash.clone(),
            interrupts.clone(),
            config.hle,
        )?;
        cpu.set_frequency(config.frequency);
        if config.hle {
            cpu.perform_hle(config.hle_entry);
        }

        let audio: Shared<dyn AudioSink> = buzzer.clone();
        let timer0 = Timer::timer0(ram.clone(), interrupts.clone());
        let timer1 = Timer::timer1(ram.clone(), interrupts.clone(), audio);

        Ok(Self {
            cpu,
            timer0,
            timer1,
            ram,
            flash,
            interrupts,
            buzzer,
            debug: false,
        })
    }

    /// Logs every decoded instruction at debug level.
    pub const fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// One instruction, then as many timer cycles as it took, then one
    /// interrupt poll. Returns the cycles that passed.
    pub fn step(&mut self) -> u8 {
        let cycles = self.cpu.process_instruction(self.debug).cycles();

        for _ in 0..cycles {
            self.timer0.step();
            self.timer1.step();
        }

        self.cpu.process_interrupts();
        cycles
    }

    /// Steps until at least `cycles` cycles have passed; returns how many did.
    pub fn run_cycles(&mut self, cycles: u64) -> u64 {
        let mut elapsed = 0;
        while elapsed < cycles {
            elapsed += u64::from(self.step());
        }
        elapsed
    }
}
