//! The three growing sequences the two passes build and mutate:
//! declarations, code words and data words.

use p15_isa::Word;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    Data,
    String,
    Entry,
    Extern,
    Code,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub value: i32,
    pub line: u32,
}

/// A code word is either finalized or still awaiting its label's
/// address from the second pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeWordBody {
    Encoded(Word),
    Pending { label: String, line: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeWord {
    pub address: u16,
    pub body: CodeWordBody,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataWord {
    pub address: u16,
    pub word: Word,
}

/// A reference to an external symbol finalized in the second pass,
/// recorded in emission order for the `.ext` artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalReference {
    pub name: String,
    pub address: u16,
}

#[derive(Default, Debug)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub code: Vec<CodeWord>,
    pub data: Vec<DataWord>,
    pub ic: u16,
    pub dc: u16,
}

impl Program {
    pub fn new() -> Program {
        Program {
            declarations: Vec::new(),
            code: Vec::new(),
            data: Vec::new(),
            ic: p15_isa::ORIGIN,
            dc: 0,
        }
    }

    /// The most recent non-Entry declaration for `name`, if any.
    pub fn find_definition(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.name == name && d.kind != DeclarationKind::Entry)
    }

    pub fn find_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}
