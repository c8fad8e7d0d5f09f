//! Machine policy the middle end has to know about: how big a word is and how
//! many arguments are passed in registers.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 32 bit MIPS. Words are 4 bytes and the first 4 arguments are passed in
    /// `$a0`-`$a3`.
    #[default]
    Mips32,
}

impl Target {
    /// Size of a machine word in bytes. Every Tiger value occupies one word.
    pub fn word_size(self) -> i64 {
        match self {
            Target::Mips32 => 4,
        }
    }

    /// How many formals (including the static link) are passed in registers
    pub fn register_budget(self) -> usize {
        match self {
            Target::Mips32 => 4,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompileOptions {
    pub target: Target,
}
