//! The syntax tree handed to the middle end by the parser. Every node owns its
//! children and carries the position it was parsed at.

use std::cell::Cell;

use super::{Position, intern::InternedSymbol};

#[cfg(test)]
pub mod build;
pub mod visit;

#[derive(Debug)]
pub struct Identifier {
    pub position: Position,
    pub symbol: InternedSymbol,
}

/// Whether a declared variable is referenced from a function nested inside
/// the one that declares it. Starts out false and is only ever flipped to true
/// by escape analysis.
#[derive(Debug, Default)]
pub struct Escape(Cell<bool>);

impl Escape {
    pub fn mark(&self) {
        self.0.set(true);
    }

    pub fn escapes(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
pub struct Expression {
    pub position: Position,
    pub kind: ExpressionKind,
}

#[derive(Debug)]
pub enum ExpressionKind {
    Nil,
    Variable(Box<Variable>),
    Integer(i64),
    String(String),
    Call {
        function: Identifier,
        arguments: Vec<Expression>,
    },
    Binary {
        lhs: Box<Expression>,
        operator: BinaryOperator,
        rhs: Box<Expression>,
    },
    Record {
        ty: Identifier,
        fields: Vec<FieldInitializer>,
    },
    Array {
        ty: Identifier,
        size: Box<Expression>,
        initializer: Box<Expression>,
    },
    Sequence(Vec<Expression>),
    If {
        condition: Box<Expression>,
        positive: Box<Expression>,
        negative: Option<Box<Expression>>,
    },
    While {
        condition: Box<Expression>,
        body: Box<Expression>,
    },
    For {
        variable: Identifier,
        escape: Escape,
        low: Box<Expression>,
        high: Box<Expression>,
        body: Box<Expression>,
    },
    Break,
    Let {
        declarations: Vec<Declaration>,
        body: Box<Expression>,
    },
    Assignment {
        variable: Box<Variable>,
        value: Box<Expression>,
    },
}

#[derive(Debug)]
pub struct BinaryOperator {
    pub position: Position,
    pub kind: BinaryOperatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorKind {
    Add,                  // +
    Subtract,             // -
    Multiply,             // *
    Divide,               // /
    Equals,               // =
    NotEquals,            // <>
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=
    And,                  // &
    Or,                   // |
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorClass {
    Arithmetic,
    Equality,
    Comparison,
    Logical,
}

impl BinaryOperatorKind {
    pub fn class(self) -> BinaryOperatorClass {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                BinaryOperatorClass::Arithmetic
            }
            Self::Equals | Self::NotEquals => BinaryOperatorClass::Equality,
            Self::LessThan
            | Self::LessThanOrEqualTo
            | Self::GreaterThan
            | Self::GreaterThanOrEqualTo => BinaryOperatorClass::Comparison,
            Self::And | Self::Or => BinaryOperatorClass::Logical,
        }
    }
}

impl core::fmt::Display for BinaryOperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqualTo => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqualTo => ">=",
            Self::And => "&",
            Self::Or => "|",
        };

        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct FieldInitializer {
    pub position: Position,
    pub name: Identifier,
    pub value: Expression,
}

#[derive(Debug)]
pub struct Variable {
    pub position: Position,
    pub kind: VariableKind,
}

#[derive(Debug)]
pub enum VariableKind {
    /// x
    Simple(Identifier),
    /// x.field
    Field {
        record: Box<Variable>,
        field: Identifier,
    },
    /// x[index]
    Subscript {
        array: Box<Variable>,
        index: Box<Expression>,
    },
}

#[derive(Debug)]
pub struct Declaration {
    pub position: Position,
    pub kind: DeclarationKind,
}

/// Consecutive function or type declarations are grouped into a single batch
/// by the parser so that they may refer to each other.
#[derive(Debug)]
pub enum DeclarationKind {
    Functions(Vec<FunctionDeclaration>),
    Types(Vec<TypeDeclaration>),
    Variable(VariableDeclaration),
}

#[derive(Debug)]
pub struct FunctionDeclaration {
    pub position: Position,
    pub name: Identifier,
    pub parameters: Vec<Field>,
    pub result: Option<Identifier>,
    pub body: Expression,
}

/// `name: ty`, used both for function parameters and record type fields
#[derive(Debug)]
pub struct Field {
    pub position: Position,
    pub name: Identifier,
    pub ty: Identifier,
    /// Only meaningful for function parameters
    pub escape: Escape,
}

#[derive(Debug)]
pub struct TypeDeclaration {
    pub position: Position,
    pub name: Identifier,
    pub ty: Type,
}

#[derive(Debug)]
pub struct VariableDeclaration {
    pub name: Identifier,
    pub escape: Escape,
    pub ty: Option<Identifier>,
    pub initializer: Box<Expression>,
}

#[derive(Debug)]
pub struct Type {
    pub position: Position,
    pub kind: TypeKind,
}

#[derive(Debug)]
pub enum TypeKind {
    /// type a = b
    Name(Identifier),
    /// type a = { x: int, y: string }
    Record(Vec<Field>),
    /// type a = array of b
    Array(Identifier),
}
