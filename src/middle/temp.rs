//! Abstract registers and code labels. Both are handed out by a
//! [`TempFactory`] owned by a single compilation so names never collide
//! within, and never leak between, compilations.

use crate::{
    frontend::intern::InternedSymbol,
    index::{Index, simple_index},
};

simple_index! {
    /// An abstract register. There are an unlimited number of these, the
    /// register allocator maps them onto machine registers later.
    pub struct Temp;
}

impl Temp {
    /// Holds the address of the current activation record
    pub const FRAME_POINTER: Self = Self(0);
    /// Holds a function's return value
    pub const RETURN_VALUE: Self = Self(1);

    /// Temps below this are reserved for special purposes
    const FIRST_GENERAL: u32 = 100;
}

/// A symbolic machine code address. Only fixed, externally visible names go
/// through the interning table. Generated labels carry their counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// Runtime support functions and the main program
    Named(InternedSymbol),
    /// `L{id}`
    Anonymous(u32),
    /// `{name}_{id}`, the entry point of a Tiger function
    Function(InternedSymbol, u32),
}

impl Label {
    pub fn named(name: &str) -> Self {
        Label::Named(InternedSymbol::new(name))
    }
}

impl core::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Named(name) => write!(f, "{name}"),
            Label::Anonymous(id) => write!(f, "L{id}"),
            Label::Function(name, id) => write!(f, "{name}_{id}"),
        }
    }
}

#[derive(Debug)]
pub struct TempFactory {
    next_temp: Temp,
    next_label: u32,
}

impl TempFactory {
    pub fn new() -> Self {
        Self {
            next_temp: Temp::new(Temp::FIRST_GENERAL as usize),
            next_label: 0,
        }
    }

    pub fn new_temp(&mut self) -> Temp {
        let temp = self.next_temp;
        self.next_temp.increment_by(1);
        temp
    }

    /// Creates a fresh anonymous label
    pub fn new_label(&mut self) -> Label {
        Label::Anonymous(self.bump_label())
    }

    /// Creates a fresh label which still mentions the name of the function it
    /// belongs to
    pub fn new_function_label(&mut self, name: InternedSymbol) -> Label {
        Label::Function(name, self.bump_label())
    }

    fn bump_label(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }
}

impl Default for TempFactory {
    fn default() -> Self {
        Self::new()
    }
}
