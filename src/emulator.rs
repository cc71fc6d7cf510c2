// Game Boy Emulator Core
//
// A session ties the CPU to the collaborators that live outside it (for now
// the serial port) and provides the main emulation loop. Everything goes
// through the CPU's public hooks.

use crate::config::CpuConfig;
use crate::cpu::{Cpu, CpuState};
use crate::error::CpuError;
use crate::serial::SerialPort;

/// The main emulator structure
pub struct Emulator {
    pub cpu: Cpu,
    pub serial: SerialPort,
}

impl Emulator {
    /// Create a new emulator with raw ROM data
    pub fn with_rom(rom: &[u8]) -> Result<Self, CpuError> {
        Self::with_config(rom, CpuConfig::default())
    }

    pub fn with_config(rom: &[u8], config: CpuConfig) -> Result<Self, CpuError> {
        Ok(Self {
            cpu: Cpu::with_config(rom, config)?,
            serial: SerialPort::new(),
        })
    }

    /// Reset the CPU and drop captured serial output
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.serial.clear();
        self.cpu.reset()
    }

    /// Execute one CPU instruction
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let cycles = self.cpu.step()?;
        self.serial.poll(&mut self.cpu);
        Ok(cycles)
    }

    /// Total cycles executed
    pub fn cycles(&self) -> u64 {
        self.cpu.clock().total_cycles()
    }

    fn running(&self) -> bool {
        self.cpu.state() == CpuState::Fetching
    }

    /// Run until the CPU halts or reaches max cycles
    pub fn run_until_halt(&mut self, max_cycles: u64) -> Result<bool, CpuError> {
        while self.running() && self.cycles() < max_cycles {
            self.step()?;
        }
        Ok(self.cpu.state() == CpuState::Halted)
    }

    /// Run for a specific number of cycles
    /// Returns the cycles actually consumed
    pub fn run_cycles(&mut self, cycles: u64) -> Result<u64, CpuError> {
        let start = self.cycles();
        let target = start + cycles;
        while self.running() && self.cycles() < target {
            self.step()?;
        }
        Ok(self.cycles() - start)
    }

    /// Run until serial output contains a specific string or max cycles reached
    pub fn run_until_serial_contains(
        &mut self,
        needle: &str,
        max_cycles: u64,
    ) -> Result<bool, CpuError> {
        while self.running() && self.cycles() < max_cycles {
            self.step()?;
            if self.serial_output().contains(needle) {
                return Ok(true);
            }
        }
        Ok(self.serial_output().contains(needle))
    }

    /// Get current serial output
    pub fn serial_output(&self) -> String {
        self.serial.output_string()
    }

    /// Check if test passed (output contains "Passed")
    pub fn test_passed(&self) -> bool {
        let output = self.serial_output();
        output.contains("Passed") || output.contains("passed")
    }

    /// Check if test failed (output contains "Failed")
    pub fn test_failed(&self) -> bool {
        let output = self.serial_output();
        output.contains("Failed") || output.contains("failed")
    }
}
