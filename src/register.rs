use util::{EnumFromStr, ParseEnumError};
use util_derive::EnumFromStr;

/// Operand registers `r0`..`r7`. `PSW` and `PC` are reserved keywords
/// recognized by the lexer but are never valid values of this type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
#[repr(u8)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_str(s: &str) -> Result<Register, ParseEnumError> {
        <Register as EnumFromStr>::from_str(s)
    }
}

impl std::str::FromStr for Register {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Register, ParseEnumError> {
        <Register as EnumFromStr>::from_str(s)
    }
}

/// `true` for the identifiers that the keyword table reserves without
/// ever admitting as an operand: `PSW` and `PC`.
pub fn is_reserved_non_operand(tok: &str) -> bool {
    tok == "PSW" || tok == "PC"
}
