//! First pass: per-line classification, symbol collection and partial
//! encoding. Forward label references are left [`model::CodeWordBody::Pending`].

use p15_isa::{word::fits_signed, AddressingMode, Are, Directive, Opcode, Position, Word};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{
    first_word, is_blank, is_directive, is_opcode, is_valid_identifier, parse_signed_literal,
};
use crate::macros::MacroTable;
use crate::model::{CodeWord, CodeWordBody, DataWord, Declaration, DeclarationKind, Program};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operand<'a> {
    Immediate(i32),
    Register(p15_isa::Register, AddressingMode),
    Label(&'a str),
}

impl<'a> Operand<'a> {
    fn mode(self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Register(_, mode) => mode,
            Operand::Label(_) => AddressingMode::Direct,
        }
    }

    fn is_register_kind(self) -> bool {
        matches!(self.mode(), AddressingMode::IndirectRegister | AddressingMode::DirectRegister)
    }
}

fn parse_operand(tok: &str) -> Result<Operand<'_>, String> {
    if let Some(rest) = tok.strip_prefix('#') {
        return match parse_signed_literal(rest) {
            Some(v) if fits_signed(v, p15_isa::IMMEDIATE_BITS) => Ok(Operand::Immediate(v)),
            Some(_) => Err("immediate value out of range for a 12-bit signed field".to_string()),
            None => Err("no number detected after the '#' symbol".to_string()),
        };
    }
    if let Some(rest) = tok.strip_prefix('*') {
        return match p15_isa::Register::from_str(rest) {
            Ok(r) => Ok(Operand::Register(r, AddressingMode::IndirectRegister)),
            Err(_) => Err(format!("'{}' is not a register name", rest)),
        };
    }
    if let Ok(r) = p15_isa::Register::from_str(tok) {
        return Ok(Operand::Register(r, AddressingMode::DirectRegister));
    }
    match is_valid_identifier(tok) {
        Ok(()) => Ok(Operand::Label(tok)),
        Err(reason) => Err(format!("'{}' is not a valid operand: {}", tok, reason)),
    }
}

fn split_label(line: &str) -> Result<Option<(&str, &str)>, &'static str> {
    let ws_idx = line.find(char::is_whitespace);
    let colon_idx = line.find(':');
    match colon_idx {
        Some(ci) if ws_idx.map_or(true, |wi| ci < wi) => {
            let label = &line[..ci];
            let rest = &line[ci + 1..];
            if !rest.starts_with(char::is_whitespace) {
                return Err("a label must be followed by whitespace");
            }
            if is_blank(rest) {
                return Err("a label must be followed by a directive or instruction");
            }
            Ok(Some((label, rest)))
        }
        _ => Ok(None),
    }
}

fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Splits the tail of a two-operand instruction into its source and
/// target operand tokens, enforcing the single-comma `src , dst` shape.
fn split_two_operands(tail: &str) -> Result<(&str, &str), String> {
    let tail = tail.trim();
    let comma = tail.find(',').ok_or_else(|| "expected 'source, target'".to_string())?;
    let src = tail[..comma].trim();
    let dst = tail[comma + 1..].trim();
    if src.is_empty() {
        return Err("missing source operand".to_string());
    }
    if dst.is_empty() {
        return Err("missing target operand".to_string());
    }
    if dst.contains(',') {
        return Err("too many operands".to_string());
    }
    Ok((src, dst))
}

pub fn run(expanded: &str, macros: &MacroTable) -> (Program, Diagnostics) {
    let mut program = Program::new();
    let mut diagnostics = Diagnostics::new();

    for (idx, raw_line) in expanded.lines().enumerate() {
        let line_no = idx as u32 + 1;
        process_line(raw_line, line_no, macros, &mut program, &mut diagnostics);
    }

    let total = program.ic + program.dc - p15_isa::ORIGIN;
    if total > p15_isa::MAX_IC_PLUS_DC {
        diagnostics.push(
            DiagnosticKind::Capacity,
            expanded.lines().count() as u32,
            format!(
                "final address {} exceeds the addressable range",
                p15_isa::ORIGIN as u32 + total as u32
            ),
        );
    }

    for data_word in &mut program.data {
        data_word.address += program.ic;
    }
    for decl in &mut program.declarations {
        if matches!(decl.kind, DeclarationKind::Data | DeclarationKind::String) {
            decl.value += program.ic as i32;
        }
    }

    (program, diagnostics)
}

fn process_line(
    raw_line: &str,
    line_no: u32,
    macros: &MacroTable,
    program: &mut Program,
    diagnostics: &mut Diagnostics,
) {
    if is_blank(raw_line) {
        return;
    }

    let label = match split_label(raw_line) {
        Ok(l) => l,
        Err(reason) => {
            diagnostics.push(DiagnosticKind::Naming, line_no, reason);
            None
        }
    };

    let mut label_name = None;
    if let Some((candidate, _)) = label {
        match is_valid_identifier(candidate) {
            Ok(()) if program.find_definition(candidate).is_some() => {
                diagnostics.push(
                    DiagnosticKind::DeclarationConflict,
                    line_no,
                    format!("'{}' is already declared", candidate),
                );
            }
            Ok(()) if macros.contains(candidate) => {
                diagnostics.push(
                    DiagnosticKind::Naming,
                    line_no,
                    format!("'{}' conflicts with a macro name", candidate),
                );
            }
            Ok(()) => label_name = Some(candidate),
            Err(reason) => {
                diagnostics.push(
                    DiagnosticKind::Naming,
                    line_no,
                    format!("invalid label '{}': {}", candidate, reason),
                );
            }
        }
    }

    let remainder = label.map(|(_, rest)| rest).unwrap_or(raw_line);
    let (first, tail) = first_word(remainder);

    if let Some(directive) = is_directive(first) {
        if directive.is_declaration_only() && label.is_some() {
            tracing::warn!(line = line_no, "label before '{}' is ignored", first);
        }
        match directive {
            Directive::Data => process_data(tail, line_no, label_name, program, diagnostics),
            Directive::String => process_string(tail, line_no, label_name, program, diagnostics),
            Directive::Entry => process_declaration(
                Directive::Entry,
                tail,
                line_no,
                program,
                diagnostics,
            ),
            Directive::Extern => process_declaration(
                Directive::Extern,
                tail,
                line_no,
                program,
                diagnostics,
            ),
            Directive::Code => unreachable!("synthetic directive has no keyword"),
        }
        return;
    }

    if let Some(opcode) = is_opcode(first) {
        if let Some(name) = label_name {
            program.declarations.push(Declaration {
                name: name.to_string(),
                kind: DeclarationKind::Code,
                value: program.ic as i32,
                line: line_no,
            });
        }
        process_instruction(opcode, tail, line_no, program, diagnostics);
        return;
    }

    diagnostics.push(
        DiagnosticKind::DirectiveShape,
        line_no,
        format!("unrecognized instruction '{}'", first),
    );
}

fn process_data(
    tail: &str,
    line_no: u32,
    label: Option<&str>,
    program: &mut Program,
    diagnostics: &mut Diagnostics,
) {
    if let Some(name) = label {
        program.declarations.push(Declaration {
            name: name.to_string(),
            kind: DeclarationKind::Data,
            value: program.dc as i32,
            line: line_no,
        });
    }

    let trimmed = tail.trim();
    if trimmed.is_empty() {
        diagnostics.push(DiagnosticKind::DirectiveShape, line_no, "'.data' requires at least one value");
        return;
    }

    for part in trimmed.split(',') {
        let value_tok = part.trim();
        if value_tok.is_empty() {
            diagnostics.push(
                DiagnosticKind::DirectiveShape,
                line_no,
                "'.data' list has an empty element (leading, trailing or doubled comma)",
            );
            continue;
        }
        match parse_signed_literal(value_tok) {
            Some(v) if fits_signed(v, p15_isa::DATA_LITERAL_BITS) => {
                let mut word = Word::zero();
                word.pack_signed(v, 0, p15_isa::word::WORD_BITS);
                program.data.push(DataWord { address: program.dc, word });
                program.dc += 1;
            }
            Some(_) => diagnostics.push(
                DiagnosticKind::DirectiveShape,
                line_no,
                format!("'{}' is out of the 14-bit signed range", value_tok),
            ),
            None => diagnostics.push(
                DiagnosticKind::DirectiveShape,
                line_no,
                format!("'{}' is not an integer literal", value_tok),
            ),
        }
    }
}

fn process_string(
    tail: &str,
    line_no: u32,
    label: Option<&str>,
    program: &mut Program,
    diagnostics: &mut Diagnostics,
) {
    if let Some(name) = label {
        program.declarations.push(Declaration {
            name: name.to_string(),
            kind: DeclarationKind::String,
            value: program.dc as i32,
            line: line_no,
        });
    }

    let trimmed = tail.trim_start();
    let rest = match trimmed.strip_prefix('"') {
        Some(r) => r,
        None => {
            diagnostics.push(DiagnosticKind::DirectiveShape, line_no, "'.string' requires an opening quote");
            return;
        }
    };
    let close = match rest.find('"') {
        Some(i) => i,
        None => {
            diagnostics.push(DiagnosticKind::DirectiveShape, line_no, "'.string' is missing a closing quote");
            return;
        }
    };
    let body = &rest[..close];
    let after = &rest[close + 1..];
    if !is_blank(after) {
        diagnostics.push(DiagnosticKind::DirectiveShape, line_no, "unexpected characters after the closing quote");
        return;
    }
    if let Some(bad) = body.chars().find(|c| !is_printable(*c)) {
        diagnostics.push(
            DiagnosticKind::DirectiveShape,
            line_no,
            format!("non-printable character {:?} in string literal", bad),
        );
        return;
    }

    for byte in body.bytes() {
        let mut word = Word::zero();
        word.pack_signed(byte as i32, 0, p15_isa::word::WORD_BITS);
        program.data.push(DataWord { address: program.dc, word });
        program.dc += 1;
    }
    program.data.push(DataWord { address: program.dc, word: Word::zero() });
    program.dc += 1;
}

fn process_declaration(
    directive: Directive,
    tail: &str,
    line_no: u32,
    program: &mut Program,
    diagnostics: &mut Diagnostics,
) {
    let (name_tok, rest) = first_word(tail);
    if !is_blank(rest) {
        diagnostics.push(DiagnosticKind::DirectiveShape, line_no, "expected a single identifier");
        return;
    }
    if let Err(reason) = is_valid_identifier(name_tok) {
        diagnostics.push(
            DiagnosticKind::Naming,
            line_no,
            format!("invalid name '{}': {}", name_tok, reason),
        );
        return;
    }

    let has_extern = program.declarations.iter().any(|d| d.name == name_tok && d.kind == DeclarationKind::Extern);
    let has_entry = program.declarations.iter().any(|d| d.name == name_tok && d.kind == DeclarationKind::Entry);
    let has_definition = program.find_definition(name_tok).is_some();

    match directive {
        Directive::Entry => {
            if has_extern {
                diagnostics.push(
                    DiagnosticKind::DeclarationConflict,
                    line_no,
                    format!("'{}' was already declared '.extern'", name_tok),
                );
                return;
            }
            program.declarations.push(Declaration {
                name: name_tok.to_string(),
                kind: DeclarationKind::Entry,
                value: line_no as i32,
                line: line_no,
            });
        }
        Directive::Extern => {
            if has_extern {
                diagnostics.push(
                    DiagnosticKind::DeclarationConflict,
                    line_no,
                    format!("'{}' is already declared '.extern'", name_tok),
                );
                return;
            }
            if has_entry || has_definition {
                diagnostics.push(
                    DiagnosticKind::DeclarationConflict,
                    line_no,
                    format!("'{}' is already defined or declared '.entry'", name_tok),
                );
                return;
            }
            program.declarations.push(Declaration {
                name: name_tok.to_string(),
                kind: DeclarationKind::Extern,
                value: line_no as i32,
                line: line_no,
            });
        }
        _ => unreachable!("only entry/extern reach process_declaration"),
    }
}

fn process_instruction(
    opcode: Opcode,
    tail: &str,
    line_no: u32,
    program: &mut Program,
    diagnostics: &mut Diagnostics,
) {
    use p15_isa::Arity;

    let (src, dst) = match opcode.arity() {
        Arity::Two => match split_two_operands(tail) {
            Ok(pair) => (Some(pair.0), Some(pair.1)),
            Err(reason) => {
                diagnostics.push(DiagnosticKind::OperandLegality, line_no, reason);
                return;
            }
        },
        Arity::One => {
            let trimmed = tail.trim();
            if trimmed.is_empty() {
                diagnostics.push(DiagnosticKind::OperandLegality, line_no, "missing operand");
                return;
            }
            if trimmed.contains(',') {
                diagnostics.push(DiagnosticKind::OperandLegality, line_no, "too many operands");
                return;
            }
            (None, Some(trimmed))
        }
        Arity::Zero => {
            if !is_blank(tail) {
                diagnostics.push(DiagnosticKind::OperandLegality, line_no, "unexpected operand");
                return;
            }
            (None, None)
        }
    };

    let src_operand = match src.map(parse_operand) {
        Some(Ok(op)) => Some(op),
        Some(Err(reason)) => {
            diagnostics.push(DiagnosticKind::OperandLegality, line_no, reason);
            return;
        }
        None => None,
    };
    let dst_operand = match dst.map(parse_operand) {
        Some(Ok(op)) => Some(op),
        Some(Err(reason)) => {
            diagnostics.push(DiagnosticKind::OperandLegality, line_no, reason);
            return;
        }
        None => None,
    };

    if let Some(op) = src_operand {
        if !p15_isa::operand::is_legal(opcode, Position::Source, op.mode()) {
            diagnostics.push(
                DiagnosticKind::OperandLegality,
                line_no,
                "addressing mode not legal as a source for this opcode",
            );
            return;
        }
    }
    if let Some(op) = dst_operand {
        if !p15_isa::operand::is_legal(opcode, Position::Target, op.mode()) {
            diagnostics.push(
                DiagnosticKind::OperandLegality,
                line_no,
                "addressing mode not legal as a target for this opcode",
            );
            return;
        }
    }

    let mut first = Word::zero();
    first.pack_small(opcode.value() as u16, 11, 4);
    first.set_are(Are::Absolute);
    if let Some(op) = src_operand {
        first.set_bit_at(op.mode().one_hot_bit(7));
    }
    if let Some(op) = dst_operand {
        first.set_bit_at(op.mode().one_hot_bit(3));
    }
    program.code.push(CodeWord { address: program.ic, body: CodeWordBody::Encoded(first) });
    program.ic += 1;

    let shared = match (src_operand, dst_operand) {
        (Some(s), Some(d)) => s.is_register_kind() && d.is_register_kind(),
        _ => false,
    };

    if let (true, Some(s), Some(d)) = (shared, src_operand, dst_operand) {
        let mut word = Word::zero();
        if let Operand::Register(r, _) = s {
            word.pack_small(r.number() as u16, 6, 3);
        }
        if let Operand::Register(r, _) = d {
            word.pack_small(r.number() as u16, 3, 3);
        }
        word.set_are(Are::Absolute);
        program.code.push(CodeWord { address: program.ic, body: CodeWordBody::Encoded(word) });
        program.ic += 1;
        return;
    }

    if let Some(op) = src_operand {
        emit_operand_word(op, line_no, 6, program);
    }
    if let Some(op) = dst_operand {
        emit_operand_word(op, line_no, 3, program);
    }
}

fn emit_operand_word(op: Operand<'_>, line_no: u32, register_bit: u32, program: &mut Program) {
    match op {
        Operand::Immediate(v) => {
            let mut word = Word::zero();
            word.pack_signed(v, 3, p15_isa::IMMEDIATE_BITS);
            word.set_are(Are::Absolute);
            program.code.push(CodeWord { address: program.ic, body: CodeWordBody::Encoded(word) });
        }
        Operand::Register(r, _) => {
            let mut word = Word::zero();
            word.pack_small(r.number() as u16, register_bit, 3);
            word.set_are(Are::Absolute);
            program.code.push(CodeWord { address: program.ic, body: CodeWordBody::Encoded(word) });
        }
        Operand::Label(name) => {
            program.code.push(CodeWord {
                address: program.ic,
                body: CodeWordBody::Pending { label: name.to_string(), line: line_no },
            });
        }
    }
    program.ic += 1;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::macros::expand;

    fn run_source(source: &str) -> (Program, Diagnostics) {
        let (expanded, table, macro_diag) = expand(source);
        assert!(!macro_diag.has_errors(), "{:?}", macro_diag);
        run(&expanded, &table)
    }

    #[test]
    fn immediate_and_direct_register_scenario() {
        let (program, diagnostics) = run_source("mov #5, r3\n");
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.iter().collect::<Vec<_>>());
        assert_eq!(program.code.len(), 3);
        let first = match program.code[0].body {
            CodeWordBody::Encoded(w) => w,
            _ => panic!("expected encoded first word"),
        };
        assert_eq!((first.raw() >> 11) & 0b1111, 0);
        assert!(first.is_bit_set(7));
        assert!(first.is_bit_set(6));
        let op1 = match program.code[1].body {
            CodeWordBody::Encoded(w) => w,
            _ => panic!(),
        };
        assert_eq!((op1.raw() >> 3) & 0b1111_1111_1111, 5);
        let op2 = match program.code[2].body {
            CodeWordBody::Encoded(w) => w,
            _ => panic!(),
        };
        assert_eq!((op2.raw() >> 3) & 0b111, 3);
    }

    #[test]
    fn both_registers_share_one_word() {
        let (program, diagnostics) = run_source("add r1, r2\n");
        assert!(!diagnostics.has_errors());
        assert_eq!(program.code.len(), 2);
        let shared = match program.code[1].body {
            CodeWordBody::Encoded(w) => w,
            _ => panic!(),
        };
        assert_eq!((shared.raw() >> 6) & 0b111, 1);
        assert_eq!((shared.raw() >> 3) & 0b111, 2);
    }

    #[test]
    fn data_directive_with_label() {
        let (program, diagnostics) = run_source("LIST: .data 7, -3, 0\n");
        assert!(!diagnostics.has_errors());
        assert_eq!(program.data.len(), 3);
        assert_eq!(program.declarations[0].name, "LIST");
        assert_eq!(program.declarations[0].kind, DeclarationKind::Data);
    }

    #[test]
    fn string_directive_emits_bytes_and_terminator() {
        let (program, diagnostics) = run_source("MSG: .string \"ab\"\n");
        assert!(!diagnostics.has_errors());
        assert_eq!(program.data.len(), 3);
        assert_eq!(program.data[0].word.raw() >> 0 & 0x7fff, 97);
        assert_eq!(program.data[1].word.raw() & 0x7fff, 98);
        assert_eq!(program.data[2].word.raw() & 0x7fff, 0);
    }

    #[test]
    fn forward_reference_stays_pending() {
        let (program, diagnostics) = run_source("jmp END\n");
        assert!(!diagnostics.has_errors());
        assert!(matches!(program.code[0].body, CodeWordBody::Pending { .. }));
    }

    #[test]
    fn rejects_immediate_as_mov_target() {
        let (_, diagnostics) = run_source("mov r1, #5\n");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn rejects_extern_of_already_defined_name() {
        let (_, diagnostics) = run_source("LIST: .data 1\n.extern LIST\n");
        assert!(diagnostics.has_errors());
    }
}
