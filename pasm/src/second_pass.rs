//! Second pass: entry resolution, forward-reference resolution and
//! artifact generation.

use p15_isa::{Are, Word};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{CodeWordBody, DeclarationKind, ExternalReference, Program};

pub struct Artifacts {
    pub object: String,
    pub entries: Option<String>,
    pub externals: Option<String>,
}

pub fn run(program: &mut Program, diagnostics: &mut Diagnostics) -> Option<Artifacts> {
    resolve_entries(program, diagnostics);
    let externals = resolve_pending(program, diagnostics);

    if diagnostics.has_errors() {
        return None;
    }

    let object = render_object(program);
    let entries = render_entries(program);
    let ext = render_externals(&externals);

    Some(Artifacts { object, entries, externals: ext })
}

fn resolve_entries(program: &mut Program, diagnostics: &mut Diagnostics) {
    let resolutions: Vec<(usize, Option<i32>)> = program
        .declarations
        .iter()
        .enumerate()
        .filter(|(_, d)| d.kind == DeclarationKind::Entry)
        .map(|(i, entry)| {
            let found = program
                .declarations
                .iter()
                .find(|d| d.name == entry.name && d.kind != DeclarationKind::Entry)
                .map(|d| d.value);
            (i, found)
        })
        .collect();

    for (index, found) in resolutions {
        match found {
            Some(address) => program.declarations[index].value = address,
            None => {
                let entry = &program.declarations[index];
                diagnostics.push(
                    DiagnosticKind::DeclarationConflict,
                    entry.line,
                    format!("'.entry {}' has no matching definition", entry.name),
                );
            }
        }
    }
}

fn resolve_pending(program: &mut Program, diagnostics: &mut Diagnostics) -> Vec<ExternalReference> {
    let mut externals = Vec::new();

    for code_word in &mut program.code {
        let (label, line) = match &code_word.body {
            CodeWordBody::Pending { label, line } => (label.clone(), *line),
            CodeWordBody::Encoded(_) => continue,
        };

        let definition = program
            .declarations
            .iter()
            .find(|d| d.name == label && d.kind != DeclarationKind::Entry && d.kind != DeclarationKind::Extern);
        let extern_decl = program
            .declarations
            .iter()
            .find(|d| d.name == label && d.kind == DeclarationKind::Extern);
        let entry_only = program
            .declarations
            .iter()
            .find(|d| d.name == label && d.kind == DeclarationKind::Entry);

        if let Some(def) = definition {
            let mut word = Word::zero();
            word.pack_signed(def.value, 3, 12);
            word.set_are(Are::Relocatable);
            code_word.body = CodeWordBody::Encoded(word);
        } else if extern_decl.is_some() {
            let mut word = Word::from_raw(0);
            word.set_are(Are::External);
            code_word.body = CodeWordBody::Encoded(word);
            externals.push(ExternalReference { name: label.clone(), address: code_word.address });
        } else if entry_only.is_some() {
            // The entry-resolution step above already reported that this
            // name has no backing definition; don't report it twice.
        } else {
            diagnostics.push(
                DiagnosticKind::DeclarationConflict,
                line,
                format!("undefined label '{}'", label),
            );
        }
    }

    externals
}

fn render_object(program: &Program) -> String {
    let ic_total = program.ic - p15_isa::ORIGIN;
    let dc_total = program.dc;

    let mut ic_digits = ic_total;
    let mut space_length: i32 = 3;
    while ic_digits > 9 {
        ic_digits /= 10;
        space_length -= 1;
    }
    let pad: String = " ".repeat(space_length.max(0) as usize);

    let mut out = format!("{}{} {}\n", pad, ic_total, dc_total);
    for word in &program.code {
        if let CodeWordBody::Encoded(w) = word.body {
            out.push_str(&format!("{:04} {:05o}\n", word.address, w.raw()));
        }
    }
    for data in &program.data {
        out.push_str(&format!("{:04} {:05o}\n", data.address, data.word.raw()));
    }
    out
}

fn render_entries(program: &Program) -> Option<String> {
    let entries: Vec<_> = program
        .declarations
        .iter()
        .filter(|d| d.kind == DeclarationKind::Entry)
        .collect();
    if entries.is_empty() {
        return None;
    }
    let longest = entries.iter().map(|d| d.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let pad = " ".repeat(longest - entry.name.len() + 1);
        out.push_str(&format!("{}{}{:04}\n", entry.name, pad, entry.value));
    }
    Some(out)
}

fn render_externals(externals: &[ExternalReference]) -> Option<String> {
    if externals.is_empty() {
        return None;
    }
    let longest = externals.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for reference in externals {
        let pad = " ".repeat(longest - reference.name.len() + 2);
        out.push_str(&format!("{}{}{:04}\n", reference.name, pad, reference.address));
    }
    Some(out)
}
