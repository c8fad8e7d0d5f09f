//! Everything between the parser and instruction selection. Escape analysis
//! runs first, then the semantic analyzer type checks the program and
//! translates it to IR fragments in a single pass.

pub mod diagnostic;
pub mod env;
pub mod escape;
pub mod frame;
pub mod ir;
pub mod semantic;
pub mod table;
pub mod temp;
pub mod translate;
pub mod ty;
