// CPU Configuration
//
// What a reset leaves behind:
//   entry_point - initial PC (0x0100, the cartridge entry point)
//   boot_state  - Zeroed registers, or the values the DMG boot ROM leaves

use crate::cpu::RegisterFile;

/// Register contents after reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BootState {
    /// All registers and flags zero
    #[default]
    Zeroed,
    /// DMG post-boot values (AF=01B0, BC=0013, DE=00D8, HL=014D, SP=FFFE)
    PostBoot,
}

impl BootState {
    pub(crate) fn registers(self) -> RegisterFile {
        match self {
            BootState::Zeroed => RegisterFile::new(),
            BootState::PostBoot => RegisterFile::post_boot(),
        }
    }
}

/// Reset-time configuration for a [`crate::Cpu`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    pub entry_point: u16,
    pub boot_state: BootState,
}

impl CpuConfig {
    pub fn with_entry_point(mut self, entry_point: u16) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn with_boot_state(mut self, boot_state: BootState) -> Self {
        self.boot_state = boot_state;
        self
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            entry_point: 0x0100,
            boot_state: BootState::Zeroed,
        }
    }
}
