use colored::Colorize;

use crate::{
    frontend::{Position, ast::BinaryOperatorKind, intern::InternedSymbol},
    middle::ty::Type,
};

/// A semantic error in the program being compiled
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub position: Position,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone)]
pub enum DiagnosticKind {
    UndefinedVariable(InternedSymbol),
    UndefinedFunction(InternedSymbol),
    UndefinedType(InternedSymbol),
    /// A function name used where a variable was expected
    NotAVariable(InternedSymbol),
    /// A variable name used as the target of a call
    NotAFunction(InternedSymbol),
    IntegerRequired(BinaryOperatorKind),
    OperandMismatch { lhs: Type, rhs: Type },
    InvalidComparisonOperand(Type),
    ArgumentType {
        function: InternedSymbol,
        /// 1-based position of the argument
        index: usize,
        expected: Type,
        actual: Type,
    },
    TooFewArguments {
        function: InternedSymbol,
        expected: usize,
        actual: usize,
    },
    TooManyArguments {
        function: InternedSymbol,
        expected: usize,
        actual: usize,
    },
    NotARecordType(InternedSymbol),
    NotAnArrayType(InternedSymbol),
    FieldCount { expected: usize, actual: usize },
    FieldName {
        expected: InternedSymbol,
        actual: InternedSymbol,
    },
    FieldType {
        field: InternedSymbol,
        expected: Type,
        actual: Type,
    },
    ArraySizeNotInt(Type),
    ArrayInitializerType { expected: Type, actual: Type },
    ConditionNotInt(Type),
    IfBranchMismatch { positive: Type, negative: Type },
    IfWithoutElseNotVoid(Type),
    LoopBodyNotVoid(Type),
    ForBoundNotInt(Type),
    AssignmentMismatch { expected: Type, actual: Type },
    AssignToLoopVariable(InternedSymbol),
    FunctionRedefined(InternedSymbol),
    TypeRedefined(InternedSymbol),
    InfiniteRecursiveType(InternedSymbol),
    FunctionBodyType { expected: Type, actual: Type },
    VariableInitializer { expected: Type, actual: Type },
    /// `var x := nil` gives no way to tell which record type `x` has
    NilWithoutType,
    VoidInitializer,
    NotARecord(Type),
    NoSuchField(InternedSymbol),
    NotAnArray(Type),
    SubscriptNotInt(Type),
    BreakOutsideLoop,
}

impl Diagnostic {
    pub fn new(position: Position, kind: DiagnosticKind) -> Self {
        Self { position, kind }
    }

    /// The colored form of the diagnostic, as printed by [`Diagnostic::emit`]
    pub fn render(&self) -> String {
        format!(
            "{}: {} {}",
            self.position.to_string().dimmed(),
            "error:".red(),
            self.kind
        )
    }

    /// Reports the diagnostic on stderr
    pub fn emit(&self) {
        eprintln!("{}", self.render());
    }
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position, self.kind)
    }
}

impl core::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UndefinedVariable(name) => write!(f, "undefined variable '{name}'"),
            DiagnosticKind::UndefinedFunction(name) => write!(f, "undefined function '{name}'"),
            DiagnosticKind::UndefinedType(name) => write!(f, "undefined type '{name}'"),
            DiagnosticKind::NotAVariable(name) => {
                write!(f, "expected '{name}' to be a variable, not a function")
            }
            DiagnosticKind::NotAFunction(name) => write!(f, "'{name}' is not a function"),
            DiagnosticKind::IntegerRequired(operator) => {
                write!(f, "integer required for operator '{operator}'")
            }
            DiagnosticKind::OperandMismatch { lhs, rhs } => {
                write!(f, "the type of two operands must be the same ({lhs} and {rhs})")
            }
            DiagnosticKind::InvalidComparisonOperand(ty) => {
                write!(f, "the type of comparison's operand must be int or string, not {ty}")
            }
            DiagnosticKind::ArgumentType {
                function,
                index,
                expected,
                actual,
            } => write!(
                f,
                "passing argument {index} of '{function}' with wrong type \
                 (expected {expected}, found {actual})"
            ),
            DiagnosticKind::TooFewArguments {
                function,
                expected,
                actual,
            } => write!(
                f,
                "expect more arguments: '{function}' takes {expected} but {actual} were given"
            ),
            DiagnosticKind::TooManyArguments {
                function,
                expected,
                actual,
            } => write!(
                f,
                "expect less arguments: '{function}' takes {expected} but {actual} were given"
            ),
            DiagnosticKind::NotARecordType(name) => write!(f, "'{name}' is not a record type"),
            DiagnosticKind::NotAnArrayType(name) => write!(f, "'{name}' is not an array type"),
            DiagnosticKind::FieldCount { expected, actual } => {
                write!(f, "wrong field number: expected {expected} but found {actual}")
            }
            DiagnosticKind::FieldName { expected, actual } => {
                write!(f, "wrong field name: expected '{expected}' but found '{actual}'")
            }
            DiagnosticKind::FieldType {
                field,
                expected,
                actual,
            } => write!(
                f,
                "wrong field type for '{field}': expected {expected} but found {actual}"
            ),
            DiagnosticKind::ArraySizeNotInt(ty) => {
                write!(f, "array's size must be the int type, not {ty}")
            }
            DiagnosticKind::ArrayInitializerType { expected, actual } => write!(
                f,
                "initializer has incorrect type: expected {expected} but found {actual}"
            ),
            DiagnosticKind::ConditionNotInt(ty) => {
                write!(f, "condition's type must be integer, not {ty}")
            }
            DiagnosticKind::IfBranchMismatch { positive, negative } => {
                write!(f, "types of then and else differ ({positive} and {negative})")
            }
            DiagnosticKind::IfWithoutElseNotVoid(ty) => {
                write!(f, "if-then should return nothing, but returns {ty}")
            }
            DiagnosticKind::LoopBodyNotVoid(ty) => {
                write!(f, "loop body should return nothing, but returns {ty}")
            }
            DiagnosticKind::ForBoundNotInt(ty) => {
                write!(f, "for loop bounds should be int, not {ty}")
            }
            DiagnosticKind::AssignmentMismatch { expected, actual } => {
                write!(f, "type mismatch: cannot assign {actual} to {expected}")
            }
            DiagnosticKind::AssignToLoopVariable(name) => {
                write!(f, "assigning to the for variable '{name}'")
            }
            DiagnosticKind::FunctionRedefined(name) => write!(f, "function '{name}' redefined"),
            DiagnosticKind::TypeRedefined(name) => write!(f, "type '{name}' redefined"),
            DiagnosticKind::InfiniteRecursiveType(name) => {
                write!(f, "infinite recursive type '{name}'")
            }
            DiagnosticKind::FunctionBodyType { expected, actual } => write!(
                f,
                "function body's type is incorrect: expected {expected} but found {actual}"
            ),
            DiagnosticKind::VariableInitializer { expected, actual } => write!(
                f,
                "variable initializer type {actual} does not match explicit type {expected}"
            ),
            DiagnosticKind::NilWithoutType => write!(f, "don't know which record type to take"),
            DiagnosticKind::VoidInitializer => write!(f, "can't assign void value to a variable"),
            DiagnosticKind::NotARecord(ty) => {
                write!(f, "expected record type variable, found {ty}")
            }
            DiagnosticKind::NoSuchField(name) => write!(f, "there is no field named '{name}'"),
            DiagnosticKind::NotAnArray(ty) => write!(f, "expected array type variable, found {ty}"),
            DiagnosticKind::SubscriptNotInt(ty) => {
                write!(f, "expected integer type subscript, found {ty}")
            }
            DiagnosticKind::BreakOutsideLoop => {
                write!(f, "`break` statement can only be used within loops")
            }
        }
    }
}
