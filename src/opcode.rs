use util::{EnumFromStr, ParseEnumError};
use util_derive::EnumFromStr;

/// The sixteen opcodes, grouped by operand arity. The discriminant is the
/// 4-bit value packed at bits 11-14 of the first word, so variant order
/// here is load-bearing.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
#[repr(u8)]
pub enum Opcode {
    Mov,
    Cmp,
    Add,
    Sub,
    Lea,
    Clr,
    Not,
    Inc,
    Dec,
    Jmp,
    Bne,
    Red,
    Prn,
    Jsr,
    Rts,
    Stop,
}

/// How many operands an opcode expects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Arity {
    Two,
    One,
    Zero,
}

impl Opcode {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn arity(self) -> Arity {
        use Opcode::*;
        match self {
            Mov | Cmp | Add | Sub | Lea => Arity::Two,
            Clr | Not | Inc | Dec | Jmp | Bne | Red | Prn | Jsr => Arity::One,
            Rts | Stop => Arity::Zero,
        }
    }

    pub fn from_str(s: &str) -> Result<Opcode, ParseEnumError> {
        <Opcode as EnumFromStr>::from_str(s)
    }
}

impl std::str::FromStr for Opcode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Opcode, ParseEnumError> {
        <Opcode as EnumFromStr>::from_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_lowercase_mnemonics() {
        assert_eq!(Opcode::from_str("mov").unwrap(), Opcode::Mov);
        assert_eq!(Opcode::from_str("stop").unwrap(), Opcode::Stop);
    }

    #[test]
    fn rejects_other_case_spellings() {
        assert!(Opcode::from_str("MOV").is_err());
        assert!(Opcode::from_str("Mov").is_err());
    }

    #[test]
    fn rejects_unknown_mnemonic() {
        assert!(Opcode::from_str("movx").is_err());
    }

    #[test]
    fn opcode_values_are_positional() {
        assert_eq!(Opcode::Mov.value(), 0);
        assert_eq!(Opcode::Lea.value(), 4);
        assert_eq!(Opcode::Clr.value(), 5);
        assert_eq!(Opcode::Jsr.value(), 13);
        assert_eq!(Opcode::Rts.value(), 14);
        assert_eq!(Opcode::Stop.value(), 15);
    }

    #[test]
    fn arity_groups_match_operand_legality_table() {
        assert_eq!(Opcode::Add.arity(), Arity::Two);
        assert_eq!(Opcode::Jmp.arity(), Arity::One);
        assert_eq!(Opcode::Stop.arity(), Arity::Zero);
    }
}
