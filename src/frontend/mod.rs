//! Everything the middle end consumes from the parser: the position annotated
//! syntax tree and interned identifiers. Lexing and parsing themselves happen
//! upstream of this crate.

pub mod ast;
pub mod intern;

/// A location in the original source text. Lines and columns start at 1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.line, self.column)
    }
}
