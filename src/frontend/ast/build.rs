//! Terse constructors for hand written syntax trees in tests. Every node is
//! placed at the default position unless moved with [`at`].

use super::*;

fn ident(name: &str) -> Identifier {
    Identifier {
        position: Position::default(),
        symbol: InternedSymbol::new(name),
    }
}

fn expression(kind: ExpressionKind) -> Expression {
    Expression {
        position: Position::default(),
        kind,
    }
}

/// Moves an expression (and the variable it reads, if any) to a position
pub fn at(line: u32, column: u32, mut expression: Expression) -> Expression {
    let position = Position::new(line, column);
    expression.position = position;

    if let ExpressionKind::Variable(variable) = &mut expression.kind {
        variable.position = position;

        if let VariableKind::Simple(identifier) = &mut variable.kind {
            identifier.position = position;
        }
    }

    expression
}

pub fn nil() -> Expression {
    expression(ExpressionKind::Nil)
}

pub fn int(value: i64) -> Expression {
    expression(ExpressionKind::Integer(value))
}

pub fn string(value: &str) -> Expression {
    expression(ExpressionKind::String(value.to_owned()))
}

pub fn simple(name: &str) -> Variable {
    Variable {
        position: Position::default(),
        kind: VariableKind::Simple(ident(name)),
    }
}

pub fn field_of(record: Variable, field: &str) -> Variable {
    Variable {
        position: Position::default(),
        kind: VariableKind::Field {
            record: Box::new(record),
            field: ident(field),
        },
    }
}

pub fn subscript(array: Variable, index: Expression) -> Variable {
    Variable {
        position: Position::default(),
        kind: VariableKind::Subscript {
            array: Box::new(array),
            index: Box::new(index),
        },
    }
}

pub fn read(variable: Variable) -> Expression {
    expression(ExpressionKind::Variable(Box::new(variable)))
}

pub fn var(name: &str) -> Expression {
    read(simple(name))
}

pub fn call(function: &str, arguments: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Call {
        function: ident(function),
        arguments,
    })
}

pub fn binary(lhs: Expression, kind: BinaryOperatorKind, rhs: Expression) -> Expression {
    expression(ExpressionKind::Binary {
        lhs: Box::new(lhs),
        operator: BinaryOperator {
            position: Position::default(),
            kind,
        },
        rhs: Box::new(rhs),
    })
}

pub fn add(lhs: Expression, rhs: Expression) -> Expression {
    binary(lhs, BinaryOperatorKind::Add, rhs)
}

pub fn sub(lhs: Expression, rhs: Expression) -> Expression {
    binary(lhs, BinaryOperatorKind::Subtract, rhs)
}

pub fn eq(lhs: Expression, rhs: Expression) -> Expression {
    binary(lhs, BinaryOperatorKind::Equals, rhs)
}

pub fn lt(lhs: Expression, rhs: Expression) -> Expression {
    binary(lhs, BinaryOperatorKind::LessThan, rhs)
}

pub fn record(ty: &str, fields: Vec<(&str, Expression)>) -> Expression {
    expression(ExpressionKind::Record {
        ty: ident(ty),
        fields: fields
            .into_iter()
            .map(|(name, value)| FieldInitializer {
                position: value.position,
                name: ident(name),
                value,
            })
            .collect(),
    })
}

pub fn array(ty: &str, size: Expression, initializer: Expression) -> Expression {
    expression(ExpressionKind::Array {
        ty: ident(ty),
        size: Box::new(size),
        initializer: Box::new(initializer),
    })
}

pub fn seq(expressions: Vec<Expression>) -> Expression {
    expression(ExpressionKind::Sequence(expressions))
}

pub fn if_then(condition: Expression, positive: Expression) -> Expression {
    expression(ExpressionKind::If {
        condition: Box::new(condition),
        positive: Box::new(positive),
        negative: None,
    })
}

pub fn if_else(condition: Expression, positive: Expression, negative: Expression) -> Expression {
    expression(ExpressionKind::If {
        condition: Box::new(condition),
        positive: Box::new(positive),
        negative: Some(Box::new(negative)),
    })
}

pub fn while_loop(condition: Expression, body: Expression) -> Expression {
    expression(ExpressionKind::While {
        condition: Box::new(condition),
        body: Box::new(body),
    })
}

pub fn for_loop(variable: &str, low: Expression, high: Expression, body: Expression) -> Expression {
    expression(ExpressionKind::For {
        variable: ident(variable),
        escape: Escape::default(),
        low: Box::new(low),
        high: Box::new(high),
        body: Box::new(body),
    })
}

pub fn break_loop() -> Expression {
    expression(ExpressionKind::Break)
}

pub fn let_in(declarations: Vec<Declaration>, body: Expression) -> Expression {
    expression(ExpressionKind::Let {
        declarations,
        body: Box::new(body),
    })
}

pub fn assign(variable: Variable, value: Expression) -> Expression {
    expression(ExpressionKind::Assignment {
        variable: Box::new(variable),
        value: Box::new(value),
    })
}

fn declaration(kind: DeclarationKind) -> Declaration {
    Declaration {
        position: Position::default(),
        kind,
    }
}

pub fn var_decl(name: &str, ty: Option<&str>, initializer: Expression) -> Declaration {
    declaration(DeclarationKind::Variable(VariableDeclaration {
        name: ident(name),
        escape: Escape::default(),
        ty: ty.map(ident),
        initializer: Box::new(initializer),
    }))
}

fn fields(fields: &[(&str, &str)]) -> Vec<Field> {
    fields
        .iter()
        .map(|(name, ty)| Field {
            position: Position::default(),
            name: ident(name),
            ty: ident(ty),
            escape: Escape::default(),
        })
        .collect()
}

pub fn function(
    name: &str,
    parameters: &[(&str, &str)],
    result: Option<&str>,
    body: Expression,
) -> FunctionDeclaration {
    FunctionDeclaration {
        position: Position::default(),
        name: ident(name),
        parameters: fields(parameters),
        result: result.map(ident),
        body,
    }
}

pub fn functions(functions: Vec<FunctionDeclaration>) -> Declaration {
    declaration(DeclarationKind::Functions(functions))
}

fn type_declaration(name: &str, kind: TypeKind) -> TypeDeclaration {
    TypeDeclaration {
        position: Position::default(),
        name: ident(name),
        ty: Type {
            position: Position::default(),
            kind,
        },
    }
}

pub fn alias_type(name: &str, target: &str) -> TypeDeclaration {
    type_declaration(name, TypeKind::Name(ident(target)))
}

pub fn record_type(name: &str, record_fields: &[(&str, &str)]) -> TypeDeclaration {
    type_declaration(name, TypeKind::Record(fields(record_fields)))
}

pub fn array_type(name: &str, element: &str) -> TypeDeclaration {
    type_declaration(name, TypeKind::Array(ident(element)))
}

pub fn types(types: Vec<TypeDeclaration>) -> Declaration {
    declaration(DeclarationKind::Types(types))
}
