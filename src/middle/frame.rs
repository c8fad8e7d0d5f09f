//! Activation record layout. A [`Frame`] knows where every formal and local
//! of one function lives: either at a fixed offset from the frame pointer or
//! in a fresh temp.

use core::fmt;

use crate::{
    middle::{
        ir::{self, BinaryOperator, Expression},
        temp::{Label, Temp, TempFactory},
    },
    target::Target,
};

/// Words between the frame pointer and the first local: the return address
/// and the saved frame pointer
const RESERVED_WORDS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAccess {
    /// Byte offset from the frame pointer
    InFrame(i64),
    InRegister(Temp),
}

impl FrameAccess {
    /// The IR that reads (or, as a `Move` destination, writes) this location
    /// given the address of the frame it lives in
    pub fn to_ir(self, frame_pointer: Expression) -> Expression {
        match self {
            FrameAccess::InFrame(offset) => Expression::memory(Expression::binary(
                BinaryOperator::Plus,
                frame_pointer,
                Expression::Constant(offset),
            )),
            FrameAccess::InRegister(temp) => Expression::Temp(temp),
        }
    }
}

impl fmt::Display for FrameAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameAccess::InFrame(offset) => write!(f, "frame[{offset}]"),
            FrameAccess::InRegister(temp) => write!(f, "{temp}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub label: Label,
    /// Every formal in order, formal 0 being the static link
    pub formals: Vec<FrameAccess>,
    /// Every local in allocation order
    pub locals: Vec<FrameAccess>,
    escaping_locals: i64,
    word_size: i64,
}

impl Frame {
    /// Lays out the formals of a new frame. A formal gets a frame slot when it
    /// escapes or when it does not fit in the target's argument registers.
    pub fn new(target: Target, label: Label, escapes: &[bool], temps: &mut TempFactory) -> Self {
        let word_size = target.word_size();

        let formals = escapes
            .iter()
            .enumerate()
            .map(|(i, &escapes)| {
                if escapes || i >= target.register_budget() {
                    FrameAccess::InFrame(i as i64 * word_size)
                } else {
                    FrameAccess::InRegister(temps.new_temp())
                }
            })
            .collect();

        Self {
            label,
            formals,
            locals: Vec::new(),
            escaping_locals: 0,
            word_size,
        }
    }

    /// Escaping locals are stacked downwards below the reserved words, every
    /// other local gets a fresh temp
    pub fn alloc_local(&mut self, escapes: bool, temps: &mut TempFactory) -> FrameAccess {
        let access = if escapes {
            self.escaping_locals += 1;
            FrameAccess::InFrame(-self.word_size * (RESERVED_WORDS + self.escaping_locals))
        } else {
            FrameAccess::InRegister(temps.new_temp())
        };

        self.locals.push(access);
        access
    }

    pub fn static_link(&self) -> FrameAccess {
        self.formals[0]
    }
}

/// Support functions provided by the runtime library. None of them take a
/// static link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum RuntimeFunction {
    /// `_Alloc(bytes)` returns a fresh zeroed heap block
    #[strum(serialize = "_Alloc")]
    Alloc,
    /// `_InitArray(size, init)` returns a heap array with every element set
    #[strum(serialize = "_InitArray")]
    InitArray,
    /// `_CompareString(a, b)` returns a negative, zero or positive int
    #[strum(serialize = "_CompareString")]
    CompareString,
}

impl RuntimeFunction {
    pub fn label(self) -> Label {
        let name: &'static str = self.into();
        Label::named(name)
    }
}

/// Calls a function that follows the C calling convention
pub fn external_call(label: Label, arguments: Vec<Expression>) -> Expression {
    Expression::call(Expression::Name(label), arguments)
}

/// A unit of output handed to the back end
#[derive(Debug, Clone)]
pub enum Fragment {
    /// A string literal placed in static data at `label`
    StringLiteral { label: Label, text: String },
    /// The body of one function (or of the main program) together with the
    /// frame it runs in
    Procedure { body: ir::Statement, frame: Frame },
}
