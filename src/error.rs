//! Error related data structures.

use std::fmt::{self, Display, Formatter};

/// Top level enum for error handling within the emulator core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The cartridge data is missing, truncated, or fails the
    /// header checksum / size sanity checks.
    InvalidCartridge,

    /// The cartridge requests a feature (MBC variant, RAM/RTC size)
    /// that the running configuration does not support.
    UnsupportedFeature,

    /// The CPU fetched one of the documented-undefined LR35902
    /// opcodes (0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED,
    /// 0xF4, 0xFC, 0xFD).
    IllegalOpcode(u8),

    /// A saved state buffer could not be restored, either because
    /// its format tag does not match or its size is wrong.
    StateIncompatible,

    /// An I/O or generic failure with an attached description,
    /// kept around for file and ROM loading helpers.
    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::InvalidCartridge => String::from("Invalid cartridge data"),
            Error::UnsupportedFeature => String::from("Unsupported cartridge feature"),
            Error::IllegalOpcode(opcode) => format!("Illegal opcode 0x{:02x}", opcode),
            Error::StateIncompatible => String::from("Incompatible save state"),
            Error::CustomError(message) => message.clone(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Error {}
