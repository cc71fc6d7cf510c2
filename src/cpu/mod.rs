// Game Boy CPU (Sharp SM83 / LR35902)
//
// This is an 8-bit CPU similar to the Z80 but with some differences.
// Clock speed: 4.194304 MHz (4,194,304 cycles per second)
//
// The Cpu owns the register file, the memory bus and the clock, and drives
// fetch-decode-execute against the shared opcode tables:
//   1. read opcode at PC, PC += 1
//   2. 0xCB: read the second byte, PC += 1, look it up in the extended table
//   3. no entry: enter Faulted and report {pc, opcode}
//   4. run the handler, add its cycle cost to the clock
//
// States:
//   Fetching - executing instructions
//   Halted   - after HALT, until signal_interrupt() or reset()
//   Stopped  - after STOP, until signal_wake() or reset()
//   Faulted  - after an illegal opcode, until reset()
//
// Pacing is the caller's job: step() runs one instruction, run(budget)
// runs until the budget is spent or a non-Fetching state is reached.

mod alu;
mod cb_instructions;
mod instructions;
pub mod opcodes;
mod registers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::bus::MemoryBus;
use crate::clock::Clock;
use crate::config::CpuConfig;
use crate::error::{CpuError, Fault};

pub use opcodes::{Condition, OpcodeEntry, OpcodeTable, Operand, Operands};
pub use registers::{Flags, RegisterFile, RegisterId};

/// T-states consumed by a step while Halted or Stopped
pub const IDLE_CYCLES: u32 = 4;

/// Execution state of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Fetching,
    Halted,
    Stopped,
    Faulted(Fault),
}

/// Cooperative cancellation flag for [`Cpu::run`]
///
/// Clones share the flag, so a handle can be moved to another thread and
/// used to stop a run between two instructions. A request is dropped when
/// the run it targets returns.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the running loop to return before its next instruction
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Consume a pending request
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// The Game Boy CPU
pub struct Cpu {
    regs: RegisterFile,
    bus: MemoryBus,
    clock: Clock,
    state: CpuState,
    /// Interrupt Master Enable flag
    ime: bool,
    /// EI enables IME after the next instruction
    ime_scheduled: bool,
    rom: Vec<u8>,
    config: CpuConfig,
    table: &'static OpcodeTable,
    stop: StopHandle,
}

impl Cpu {
    /// Create a CPU with the default configuration and load `rom` at 0x0000
    pub fn new(rom: &[u8]) -> Result<Self, CpuError> {
        Self::with_config(rom, CpuConfig::default())
    }

    pub fn with_config(rom: &[u8], config: CpuConfig) -> Result<Self, CpuError> {
        let mut cpu = Self {
            regs: RegisterFile::new(),
            bus: MemoryBus::new(),
            clock: Clock::new(),
            state: CpuState::Fetching,
            ime: false,
            ime_scheduled: false,
            rom: rom.to_vec(),
            config,
            table: OpcodeTable::get(),
            stop: StopHandle::default(),
        };
        cpu.reset()?;
        Ok(cpu)
    }

    /// Zero registers, flags and clock, set PC to the entry point and reload
    /// the ROM into a cleared address space
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.bus.clear();
        self.bus.load_image(&self.rom)?;

        self.regs = self.config.boot_state.registers();
        self.regs.set(RegisterId::PC, self.config.entry_point);
        self.clock.reset();
        self.state = CpuState::Fetching;
        self.ime = false;
        self.ime_scheduled = false;

        debug!(
            "reset: {} byte image, entry point 0x{:04X}",
            self.rom.len(),
            self.config.entry_point
        );
        Ok(())
    }

    // ========== Execution ==========

    /// Execute one instruction
    /// Returns the number of T-cycles (clock cycles) consumed
    pub fn step(&mut self) -> Result<u32, CpuError> {
        match self.state {
            CpuState::Fetching => {}
            CpuState::Halted | CpuState::Stopped => {
                // Waiting for an external signal; time still passes
                self.clock.advance(IDLE_CYCLES);
                return Ok(IDLE_CYCLES);
            }
            CpuState::Faulted(fault) => return Err(fault.into()),
        }

        // Remember if EI was scheduled before this instruction
        let ei_pending = self.ime_scheduled;

        let pc = self.regs.get(RegisterId::PC);
        let entry = match self.decode(pc) {
            Ok(entry) => entry,
            Err(fault) => {
                warn!("Illegal {}", fault);
                self.state = CpuState::Faulted(fault);
                return Err(fault.into());
            }
        };
        trace!("{:04X}: {:<14} {}", pc, entry.to_string(), self.regs);

        let taken = (entry.handler)(self, entry.operands);
        let cycles = entry.cost(taken);
        self.clock.advance(cycles);

        // DI in between cancels the pending enable
        if ei_pending && self.ime_scheduled {
            self.ime = true;
            self.ime_scheduled = false;
        }

        Ok(cycles)
    }

    /// Fetch the opcode (and CB suffix) at PC and resolve its entry
    fn decode(&mut self, pc: u16) -> Result<&'static OpcodeEntry, Fault> {
        let table = self.table;
        let opcode = self.fetch();
        let entry = if opcode == opcodes::CB_PREFIX {
            let suffix = self.fetch();
            table.extended(suffix)
        } else {
            table.base(opcode)
        };
        entry.ok_or(Fault { pc, opcode })
    }

    /// Step until at least `budget` T-states have been consumed, the CPU
    /// leaves the Fetching state, or a stop is requested.
    /// Returns the T-states actually consumed.
    ///
    /// A stop request never outlives the run it was made against: whatever
    /// is pending when this returns is cleared.
    pub fn run(&mut self, budget: u64) -> Result<u64, CpuError> {
        let result = self.run_budget(budget);
        self.stop.take();
        result
    }

    fn run_budget(&mut self, budget: u64) -> Result<u64, CpuError> {
        let mut consumed = 0u64;
        while consumed < budget {
            if self.stop.take() {
                debug!("run stopped by request after {} cycles", consumed);
                break;
            }
            match self.state {
                CpuState::Fetching => consumed += self.step()? as u64,
                CpuState::Halted | CpuState::Stopped => break,
                CpuState::Faulted(fault) => return Err(fault.into()),
            }
        }
        Ok(consumed)
    }

    /// Move to a new execution state
    fn enter(&mut self, state: CpuState) {
        if self.state != state {
            debug!(
                "{:?} -> {:?} at PC=0x{:04X}",
                self.state,
                state,
                self.regs.get(RegisterId::PC)
            );
            self.state = state;
        }
    }

    // ========== External signals ==========

    /// Resume from HALT. Interrupt dispatch itself happens outside the core.
    pub fn signal_interrupt(&mut self) {
        if self.state == CpuState::Halted {
            self.enter(CpuState::Fetching);
        }
    }

    /// Resume from STOP
    pub fn signal_wake(&mut self) {
        if self.state == CpuState::Stopped {
            self.enter(CpuState::Fetching);
        }
    }

    /// Handle for cancelling a `run` from outside
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // ========== Hooks ==========

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.ime
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn register(&self, id: RegisterId) -> u16 {
        self.regs.get(id)
    }

    /// Write a register; the value is normalized to the register's width
    pub fn set_register(&mut self, id: RegisterId, value: u16) {
        self.regs.set(id, value);
    }

    /// Read a register by name ("a", "hl", "SP", ...)
    pub fn register_by_name(&self, name: &str) -> Result<u16, CpuError> {
        let id: RegisterId = name.parse()?;
        Ok(self.regs.get(id))
    }

    pub fn set_register_by_name(&mut self, name: &str, value: u16) -> Result<(), CpuError> {
        let id: RegisterId = name.parse()?;
        self.regs.set(id, value);
        Ok(())
    }

    pub fn flags(&self) -> Flags {
        self.regs.flags()
    }

    pub fn read_memory(&self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }

    /// Decode the instruction at `addr` without executing it
    pub fn disassemble(&self, addr: u16) -> Option<&'static OpcodeEntry> {
        let opcode = self.bus.read(addr);
        if opcode == opcodes::CB_PREFIX {
            self.table.extended(self.bus.read(addr.wrapping_add(1)))
        } else {
            self.table.base(opcode)
        }
    }
}
