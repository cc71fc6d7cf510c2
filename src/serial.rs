// Serial Port
//
// Test ROMs report their results over the link cable:
//   SB (0xFF01) - byte to transfer
//   SC (0xFF02) - control; writing 0x81 starts a transfer on the internal clock
//
// The core has no memory-mapped I/O, so the port lives outside it and polls
// SC through the memory hooks after every step. A started transfer is
// completed immediately: SB is captured and SC bit 7 cleared.

use log::info;

use crate::cpu::Cpu;

/// Serial transfer data
pub const SB: u16 = 0xFF01;
/// Serial transfer control
pub const SC: u16 = 0xFF02;

/// Transfer requested, internal clock
const TRANSFER_START: u8 = 0x81;

/// Captures bytes a program sends over the serial port
#[derive(Debug, Clone, Default)]
pub struct SerialPort {
    output: Vec<u8>,
}

impl SerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete a pending transfer, if any, and return the byte sent
    pub fn poll(&mut self, cpu: &mut Cpu) -> Option<u8> {
        if cpu.read_memory(SC) != TRANSFER_START {
            return None;
        }

        let byte = cpu.read_memory(SB);
        cpu.write_memory(SC, TRANSFER_START & 0x7F);
        self.output.push(byte);
        info!("serial: 0x{:02X} {:?}", byte, byte as char);
        Some(byte)
    }

    /// Raw bytes received so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Get serial output as string
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn clear(&mut self) {
        self.output.clear();
    }
}
