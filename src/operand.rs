use crate::{AddressingMode, Opcode};

/// Which side of a two-operand instruction an addressing mode is being
/// checked for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Position {
    Source,
    Target,
}

/// The operand legality table: which addressing modes an opcode accepts
/// at the source and target positions.
pub fn is_legal(opcode: Opcode, position: Position, mode: AddressingMode) -> bool {
    use AddressingMode::*;
    use Opcode::*;
    use Position::*;

    match (opcode, position) {
        (Mov, Source) | (Add, Source) | (Sub, Source) => true,
        (Mov, Target) | (Add, Target) | (Sub, Target) => mode != Immediate,

        (Cmp, Source) | (Cmp, Target) => true,

        (Lea, Source) => mode == Direct,
        (Lea, Target) => mode != Immediate,

        (Clr, Target) | (Not, Target) | (Inc, Target) | (Dec, Target) | (Red, Target) => {
            mode != Immediate
        }

        (Jmp, Target) | (Bne, Target) | (Jsr, Target) => matches!(mode, Direct | IndirectRegister),

        (Prn, Target) => true,

        (Rts, _) | (Stop, _) => false,

        // One-operand and zero-operand opcodes never take a source.
        (Clr, Source)
        | (Not, Source)
        | (Inc, Source)
        | (Dec, Source)
        | (Jmp, Source)
        | (Bne, Source)
        | (Red, Source)
        | (Prn, Source)
        | (Jsr, Source) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::AddressingMode::*;
    use crate::Opcode::*;

    #[test]
    fn mov_add_sub_forbid_immediate_target() {
        assert!(!is_legal(Mov, Position::Target, Immediate));
        assert!(is_legal(Mov, Position::Target, Direct));
        assert!(is_legal(Mov, Position::Source, Immediate));
    }

    #[test]
    fn cmp_allows_immediate_everywhere() {
        assert!(is_legal(Cmp, Position::Source, Immediate));
        assert!(is_legal(Cmp, Position::Target, Immediate));
    }

    #[test]
    fn lea_source_is_direct_only() {
        assert!(is_legal(Lea, Position::Source, Direct));
        assert!(!is_legal(Lea, Position::Source, Immediate));
        assert!(!is_legal(Lea, Position::Source, DirectRegister));
    }

    #[test]
    fn jump_family_forbids_direct_register() {
        assert!(is_legal(Jmp, Position::Target, Direct));
        assert!(is_legal(Jmp, Position::Target, IndirectRegister));
        assert!(!is_legal(Jmp, Position::Target, DirectRegister));
        assert!(!is_legal(Jmp, Position::Target, Immediate));
    }

    #[test]
    fn prn_allows_any_mode() {
        for mode in [Immediate, Direct, IndirectRegister, DirectRegister] {
            assert!(is_legal(Prn, Position::Target, mode));
        }
    }

    #[test]
    fn zero_operand_opcodes_accept_nothing() {
        for mode in [Immediate, Direct, IndirectRegister, DirectRegister] {
            assert!(!is_legal(Rts, Position::Target, mode));
            assert!(!is_legal(Stop, Position::Target, mode));
        }
    }
}
