//! IR (Intermediate Representation). A machine independent tree language in
//! which Tiger's structured control flow has been reduced to labels and
//! jumps and every variable has been given a concrete location.

use super::temp::{Label, Temp};

pub mod pretty_print;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Evaluate each statement in order
    Sequence(Vec<Statement>),
    /// Defines the constant value of a label to be the current code address
    Label(Label),
    /// Transfer control to the address `target` evaluates to. `labels` lists
    /// every possible destination.
    Jump { target: Expression, labels: Vec<Label> },
    /// Evaluate `lhs` then `rhs`, compare them and jump to `positive` if the
    /// comparison holds and `negative` otherwise
    ConditionalJump {
        operator: RelationalOperator,
        lhs: Expression,
        rhs: Expression,
        positive: Label,
        negative: Label,
    },
    /// `destination` must either be a `Temp` or a `Memory` expression
    Move {
        destination: Expression,
        source: Expression,
    },
    /// Evaluate an expression and discard the result
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// The word of memory starting at an address
    Memory(Box<Expression>),
    Temp(Temp),
    /// Evaluate the statement for its side effects and then the expression for
    /// its value
    Sequence(Box<Statement>, Box<Expression>),
    /// The address a label stands for
    Name(Label),
    Constant(i64),
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RelationalOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Statement {
    /// Unconditional jump to a known label
    pub fn jump(label: Label) -> Self {
        Statement::Jump {
            target: Expression::Name(label),
            labels: vec![label],
        }
    }

    pub fn move_to(destination: Expression, source: Expression) -> Self {
        Statement::Move {
            destination,
            source,
        }
    }

    /// Rewrites every label mentioned by this statement (and any statement
    /// nested within it)
    pub fn map_labels(&mut self, f: &mut impl FnMut(Label) -> Label) {
        match self {
            Statement::Sequence(statements) => {
                for statement in statements {
                    statement.map_labels(f);
                }
            }
            Statement::Label(label) => *label = f(*label),
            Statement::Jump { target, labels } => {
                target.map_labels(f);

                for label in labels {
                    *label = f(*label);
                }
            }
            Statement::ConditionalJump {
                lhs,
                rhs,
                positive,
                negative,
                ..
            } => {
                lhs.map_labels(f);
                rhs.map_labels(f);
                *positive = f(*positive);
                *negative = f(*negative);
            }
            Statement::Move {
                destination,
                source,
            } => {
                destination.map_labels(f);
                source.map_labels(f);
            }
            Statement::Expression(expression) => expression.map_labels(f),
        }
    }
}

impl Expression {
    pub fn binary(operator: BinaryOperator, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn memory(address: Expression) -> Self {
        Expression::Memory(Box::new(address))
    }

    pub fn sequence(statement: Statement, expression: Expression) -> Self {
        Expression::Sequence(Box::new(statement), Box::new(expression))
    }

    pub fn call(function: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            function: Box::new(function),
            arguments,
        }
    }

    pub fn map_labels(&mut self, f: &mut impl FnMut(Label) -> Label) {
        match self {
            Expression::Binary { lhs, rhs, .. } => {
                lhs.map_labels(f);
                rhs.map_labels(f);
            }
            Expression::Memory(address) => address.map_labels(f),
            Expression::Sequence(statement, expression) => {
                statement.map_labels(f);
                expression.map_labels(f);
            }
            Expression::Name(label) => *label = f(*label),
            Expression::Call {
                function,
                arguments,
            } => {
                function.map_labels(f);

                for argument in arguments {
                    argument.map_labels(f);
                }
            }
            Expression::Temp(_) | Expression::Constant(_) => {}
        }
    }
}
