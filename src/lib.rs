// Game Boy CPU Library
//
// An LR35902 interpreter: register file, flat 64KB memory bus, cycle clock
// and a table-driven dispatcher, plus the small collaborators (serial port,
// emulation session) that drive it from outside.

pub mod bits;
pub mod bus;
pub mod clock;
pub mod config;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod serial;

pub use bits::{ByteValue, WordValue};
pub use bus::MemoryBus;
pub use clock::Clock;
pub use config::{BootState, CpuConfig};
pub use cpu::{Cpu, CpuState, Flags, OpcodeEntry, RegisterFile, RegisterId, StopHandle};
pub use emulator::Emulator;
pub use error::{CpuError, Fault};
pub use serial::SerialPort;
