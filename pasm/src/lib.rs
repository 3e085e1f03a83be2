//! Two-pass assembler for the 15-bit word target: macro expansion,
//! first pass, second pass, and the diagnostics that tie them together.
//!
//! The driver (`main.rs`) owns all filesystem access; this crate's
//! public entry point, [`assemble`], works purely over `&str` in and
//! `String`s out so it stays testable without a filesystem.

pub mod diagnostics;
pub mod error;
pub mod first_pass;
pub mod lexer;
pub mod macros;
pub mod model;
pub mod second_pass;

use diagnostics::Diagnostics;

/// Everything produced by assembling one source file.
pub struct Output {
    /// The macro-expanded intermediate stream (always produced, even
    /// when later stages fail, matching the driver's `.am` contract).
    pub expanded: String,
    /// Object/entry/external artifacts. `None` if any diagnostic was
    /// raised in either pass.
    pub artifacts: Option<second_pass::Artifacts>,
    pub diagnostics: Diagnostics,
}

/// Runs the full pipeline over one file's source text.
pub fn assemble(source: &str) -> Output {
    let (expanded, table, mut diagnostics) = macros::expand(source);
    let (mut program, pass_diagnostics) = first_pass::run(&expanded, &table);
    diagnostics.extend(pass_diagnostics);

    let artifacts = second_pass::run(&mut program, &mut diagnostics);

    Output { expanded, artifacts, diagnostics }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn end_to_end_happy_path_produces_all_three_artifacts() {
        let source = "\
.extern EXT
START: mov #5, r3
       add r1, r2
       jmp END
       mov EXT, r1
END:   stop
.entry END
";
        let out = assemble(source);
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.iter().collect::<Vec<_>>());
        let artifacts = out.artifacts.expect("well-formed input should produce artifacts");
        assert!(artifacts.object.starts_with("  11 0\n"), "{}", artifacts.object);
        assert!(artifacts.entries.unwrap().starts_with("END"));
        assert!(artifacts.externals.unwrap().starts_with("EXT"));
    }

    #[test]
    fn capacity_overflow_blocks_artifacts() {
        let mut source = String::new();
        for _ in 0..4000 {
            source.push_str("stop\n");
        }
        let out = assemble(&source);
        assert!(out.diagnostics.has_errors());
        assert!(out.artifacts.is_none());
    }
}
