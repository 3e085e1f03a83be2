//! Macro expansion: two scans over the raw input producing an expanded
//! stream plus a name table consumed only for later collision checks.

use std::collections::HashMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{first_word, is_blank, is_valid_identifier, MAX_LINE_LEN};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub body: Vec<String>,
}

#[derive(Default, Debug)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.macros.keys().map(String::as_str)
    }
}

enum ScanState {
    Outside,
    InMacro { name: String, body: Vec<String> },
}

/// Runs both scans and returns the expanded stream alongside the macro
/// table (kept for name-collision checks in later stages) and any
/// diagnostics raised along the way.
pub fn expand(source: &str) -> (String, MacroTable, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let table = first_scan(source, &mut diagnostics);
    let expanded = second_scan(source, &table);
    (expanded, table, diagnostics)
}

fn check_stray_semicolon(line: &str, line_no: u32, diagnostics: &mut Diagnostics) -> bool {
    match line.find(';') {
        Some(0) => true, // whole-line comment
        Some(_) => {
            diagnostics.push(
                DiagnosticKind::Lexical,
                line_no,
                "';' is only valid as the first character of a comment line",
            );
            false
        }
        None => false,
    }
}

fn first_scan(source: &str, diagnostics: &mut Diagnostics) -> MacroTable {
    let mut table = MacroTable::default();
    let mut state = ScanState::Outside;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;

        if raw_line.len() > MAX_LINE_LEN {
            diagnostics.push(
                DiagnosticKind::Lexical,
                line_no,
                format!("line exceeds {} characters", MAX_LINE_LEN),
            );
        }

        let is_comment = check_stray_semicolon(raw_line, line_no, diagnostics);

        match &mut state {
            ScanState::Outside => {
                if is_comment {
                    continue;
                }

                let (first, tail) = first_word(raw_line);

                if first == "macr" {
                    let (name_tok, rest) = first_word(tail);
                    if !is_blank(rest) {
                        diagnostics.push(
                            DiagnosticKind::Lexical,
                            line_no,
                            "unexpected characters after macro name",
                        );
                    }
                    match is_valid_identifier(name_tok) {
                        Ok(()) if table.contains(name_tok) => {
                            diagnostics.push(
                                DiagnosticKind::Naming,
                                line_no,
                                format!("macro '{}' is already defined", name_tok),
                            );
                        }
                        Ok(()) => {
                            state = ScanState::InMacro {
                                name: name_tok.to_string(),
                                body: Vec::new(),
                            };
                        }
                        Err(reason) => {
                            diagnostics.push(
                                DiagnosticKind::Naming,
                                line_no,
                                format!("invalid macro name '{}': {}", name_tok, reason),
                            );
                        }
                    }
                } else if first == "endmacr" {
                    diagnostics.push(
                        DiagnosticKind::Lexical,
                        line_no,
                        "'endmacr' without a matching 'macr'",
                    );
                }
            }
            ScanState::InMacro { name, body } => {
                let (first, tail) = first_word(raw_line);

                if first == "endmacr" {
                    if !is_blank(tail) {
                        diagnostics.push(
                            DiagnosticKind::Lexical,
                            line_no,
                            "unexpected characters after 'endmacr'",
                        );
                    }
                    table.macros.insert(
                        name.clone(),
                        Macro {
                            name: name.clone(),
                            body: std::mem::take(body),
                        },
                    );
                    state = ScanState::Outside;
                } else {
                    body.push(raw_line.to_string());
                }
            }
        }
    }

    if let ScanState::InMacro { name, .. } = state {
        diagnostics.push(
            DiagnosticKind::Lexical,
            source.lines().count() as u32,
            format!("macro '{}' is missing a closing 'endmacr'", name),
        );
    }

    table
}

fn second_scan(source: &str, table: &MacroTable) -> String {
    let mut out = String::new();
    let mut state = ScanState::Outside;

    for raw_line in source.lines() {
        if raw_line.find(';') == Some(0) {
            continue;
        }
        let (first, tail) = first_word(raw_line);

        match &mut state {
            ScanState::Outside => {
                if first == "macr" {
                    let (name_tok, _) = first_word(tail);
                    state = ScanState::InMacro {
                        name: name_tok.to_string(),
                        body: Vec::new(),
                    };
                    continue;
                }
                if is_blank(raw_line) {
                    continue;
                }
                if let Some(m) = table.get(first) {
                    for body_line in &m.body {
                        out.push_str(body_line);
                        out.push('\n');
                    }
                } else {
                    out.push_str(raw_line);
                    out.push('\n');
                }
            }
            ScanState::InMacro { .. } => {
                if first == "endmacr" {
                    state = ScanState::Outside;
                }
            }
        }
    }

    out
}
