// CPU Errors
//
// Three things can go wrong at this layer:
//   InvalidRegister - a register name outside {a,b,c,d,e,h,l,pc,sp,af,bc,de,hl}
//   ImageTooLarge   - a ROM image that does not fit in the 64KB address space
//   IllegalOpcode   - a fetched byte with no registered handler; the CPU faults
//                     and stays faulted until reset()
//
// Wraparound arithmetic is not an error.

use std::fmt;

/// Location and value of an opcode that could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Address the opcode was fetched from
    pub pc: u16,
    /// The offending byte
    pub opcode: u8,
}

/// Errors reported by the CPU core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// Unknown register name
    InvalidRegister(String),
    /// ROM image longer than the address space
    ImageTooLarge { len: usize },
    /// No handler registered for the fetched opcode
    IllegalOpcode(Fault),
}

impl From<Fault> for CpuError {
    fn from(fault: Fault) -> Self {
        CpuError::IllegalOpcode(fault)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "opcode 0x{:02X} at 0x{:04X}", self.opcode, self.pc)
    }
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CpuError::InvalidRegister(name) => write!(f, "Invalid register: {:?}", name),
            CpuError::ImageTooLarge { len } => write!(
                f,
                "ROM image of {} bytes exceeds the 65536-byte address space",
                len
            ),
            CpuError::IllegalOpcode(fault) => write!(f, "Illegal {}", fault),
        }
    }
}

impl std::error::Error for CpuError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CpuError::IllegalOpcode(Fault { pc: 0x0150, opcode: 0xD3 });
        assert_eq!(err.to_string(), "Illegal opcode 0xD3 at 0x0150");

        let err = CpuError::ImageTooLarge { len: 70000 };
        assert!(err.to_string().contains("70000"));

        let err = CpuError::InvalidRegister("ix".into());
        assert_eq!(err.to_string(), "Invalid register: \"ix\"");
    }

    #[test]
    fn test_from_fault() {
        let fault = Fault { pc: 0x1234, opcode: 0xFD };
        assert_eq!(CpuError::from(fault), CpuError::IllegalOpcode(fault));
    }
}
