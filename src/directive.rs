/// `.data`, `.string`, `.entry`, `.extern`, plus the synthetic `Code`
/// directive standing in for "first token is an opcode". `Code` never
/// appears in source text and has no keyword of its own.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Directive {
    Data,
    String,
    Entry,
    Extern,
    Code,
}

impl Directive {
    /// Matches one of the four dotted directive keywords. Unlike
    /// `Opcode`/`Register`, this can't ride the `EnumFromStr` derive:
    /// the leading dot isn't a legal Rust identifier character.
    pub fn from_keyword(tok: &str) -> Option<Directive> {
        match tok {
            ".data" => Some(Directive::Data),
            ".string" => Some(Directive::String),
            ".entry" => Some(Directive::Entry),
            ".extern" => Some(Directive::Extern),
            _ => None,
        }
    }

    pub fn is_data_bearing(self) -> bool {
        matches!(self, Directive::Data | Directive::String)
    }

    pub fn is_declaration_only(self) -> bool {
        matches!(self, Directive::Entry | Directive::Extern)
    }
}
