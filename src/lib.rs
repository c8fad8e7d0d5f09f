//! Middle end of a compiler for the Tiger language. Takes the syntax tree
//! produced by a parser and turns it into IR fragments for a back end, or
//! into a list of diagnostics when the program is not well typed.

pub mod frontend;
pub mod index;
pub mod middle;
pub mod target;

pub use middle::{diagnostic::Diagnostic, frame::Fragment, semantic::translate_program};
pub use target::{CompileOptions, Target};
