//! Trait definition for an AST visitor which walks the tree in DFS order

use super::{
    Declaration, DeclarationKind, Expression, ExpressionKind, Field, FieldInitializer,
    FunctionDeclaration, Identifier, Type, TypeDeclaration, TypeKind, Variable,
    VariableDeclaration, VariableKind,
};

pub trait Visitor<'ast>: Sized {
    fn visit_expression(&mut self, expression: &'ast Expression) {
        walk_expression(self, expression)
    }

    fn visit_variable(&mut self, variable: &'ast Variable) {
        walk_variable(self, variable)
    }

    fn visit_declaration(&mut self, declaration: &'ast Declaration) {
        walk_declaration(self, declaration)
    }

    fn visit_function_declaration(&mut self, function: &'ast FunctionDeclaration) {
        walk_function_declaration(self, function)
    }

    fn visit_type_declaration(&mut self, declaration: &'ast TypeDeclaration) {
        walk_type_declaration(self, declaration)
    }

    fn visit_variable_declaration(&mut self, declaration: &'ast VariableDeclaration) {
        walk_variable_declaration(self, declaration)
    }

    fn visit_field(&mut self, field: &'ast Field) {
        walk_field(self, field)
    }

    fn visit_field_initializer(&mut self, initializer: &'ast FieldInitializer) {
        walk_field_initializer(self, initializer)
    }

    fn visit_type(&mut self, ty: &'ast Type) {
        walk_type(self, ty)
    }

    fn visit_identifier(&mut self, _identifier: &'ast Identifier) {}
}

pub fn walk_expression<'a>(visitor: &mut impl Visitor<'a>, expression: &'a Expression) {
    match &expression.kind {
        ExpressionKind::Nil
        | ExpressionKind::Integer(_)
        | ExpressionKind::String(_)
        | ExpressionKind::Break => {}
        ExpressionKind::Variable(variable) => visitor.visit_variable(variable),
        ExpressionKind::Call {
            function,
            arguments,
        } => {
            visitor.visit_identifier(function);

            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        ExpressionKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expression(lhs);
            visitor.visit_expression(rhs);
        }
        ExpressionKind::Record { ty, fields } => {
            visitor.visit_identifier(ty);

            for field in fields {
                visitor.visit_field_initializer(field);
            }
        }
        ExpressionKind::Array {
            ty,
            size,
            initializer,
        } => {
            visitor.visit_identifier(ty);
            visitor.visit_expression(size);
            visitor.visit_expression(initializer);
        }
        ExpressionKind::Sequence(expressions) => {
            for expression in expressions {
                visitor.visit_expression(expression);
            }
        }
        ExpressionKind::If {
            condition,
            positive,
            negative,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(positive);

            if let Some(negative) = negative {
                visitor.visit_expression(negative);
            }
        }
        ExpressionKind::While { condition, body } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(body);
        }
        ExpressionKind::For {
            variable,
            low,
            high,
            body,
            ..
        } => {
            visitor.visit_identifier(variable);
            visitor.visit_expression(low);
            visitor.visit_expression(high);
            visitor.visit_expression(body);
        }
        ExpressionKind::Let { declarations, body } => {
            for declaration in declarations {
                visitor.visit_declaration(declaration);
            }

            visitor.visit_expression(body);
        }
        ExpressionKind::Assignment { variable, value } => {
            visitor.visit_variable(variable);
            visitor.visit_expression(value);
        }
    }
}

pub fn walk_variable<'a>(visitor: &mut impl Visitor<'a>, variable: &'a Variable) {
    match &variable.kind {
        VariableKind::Simple(identifier) => visitor.visit_identifier(identifier),
        VariableKind::Field { record, field } => {
            visitor.visit_variable(record);
            visitor.visit_identifier(field);
        }
        VariableKind::Subscript { array, index } => {
            visitor.visit_variable(array);
            visitor.visit_expression(index);
        }
    }
}

pub fn walk_declaration<'a>(visitor: &mut impl Visitor<'a>, declaration: &'a Declaration) {
    match &declaration.kind {
        DeclarationKind::Functions(functions) => {
            for function in functions {
                visitor.visit_function_declaration(function);
            }
        }
        DeclarationKind::Types(types) => {
            for ty in types {
                visitor.visit_type_declaration(ty);
            }
        }
        DeclarationKind::Variable(variable) => visitor.visit_variable_declaration(variable),
    }
}

pub fn walk_function_declaration<'a>(
    visitor: &mut impl Visitor<'a>,
    function: &'a FunctionDeclaration,
) {
    visitor.visit_identifier(&function.name);

    for parameter in &function.parameters {
        visitor.visit_field(parameter);
    }

    if let Some(result) = &function.result {
        visitor.visit_identifier(result);
    }

    visitor.visit_expression(&function.body);
}

pub fn walk_type_declaration<'a>(visitor: &mut impl Visitor<'a>, declaration: &'a TypeDeclaration) {
    visitor.visit_identifier(&declaration.name);
    visitor.visit_type(&declaration.ty);
}

pub fn walk_variable_declaration<'a>(
    visitor: &mut impl Visitor<'a>,
    declaration: &'a VariableDeclaration,
) {
    visitor.visit_identifier(&declaration.name);

    if let Some(ty) = &declaration.ty {
        visitor.visit_identifier(ty);
    }

    visitor.visit_expression(&declaration.initializer);
}

pub fn walk_field<'a>(visitor: &mut impl Visitor<'a>, field: &'a Field) {
    visitor.visit_identifier(&field.name);
    visitor.visit_identifier(&field.ty);
}

pub fn walk_field_initializer<'a>(
    visitor: &mut impl Visitor<'a>,
    initializer: &'a FieldInitializer,
) {
    visitor.visit_identifier(&initializer.name);
    visitor.visit_expression(&initializer.value);
}

pub fn walk_type<'a>(visitor: &mut impl Visitor<'a>, ty: &'a Type) {
    match &ty.kind {
        TypeKind::Name(name) | TypeKind::Array(name) => visitor.visit_identifier(name),
        TypeKind::Record(fields) => {
            for field in fields {
                visitor.visit_field(field);
            }
        }
    }
}
