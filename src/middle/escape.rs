//! Escape analysis
//!
//! A variable escapes when it is referenced from a function nested inside the
//! function which declares it. Escaping variables must live in the frame of
//! their declaring function so the nested function can reach them through the
//! static link, everything else can be kept in a register.
//!
//! This is a single pass over the tree which records the function nesting
//! depth of every declaration and compares it with the depth of each use.

use super::table::SymbolTable;
use crate::frontend::{
    ast::{
        Escape, Expression, ExpressionKind, FunctionDeclaration, TypeDeclaration, Variable,
        VariableDeclaration, VariableKind,
        visit::{self, Visitor},
    },
    intern::InternedSymbol,
};

/// Marks every escaping declaration in the program
pub fn find_escapes(program: &Expression) {
    let mut finder = EscapeFinder {
        depth: 0,
        table: SymbolTable::new(),
    };

    finder.visit_expression(program);
}

#[derive(Debug)]
struct EscapeEntry<'ast> {
    depth: usize,
    escape: &'ast Escape,
}

struct EscapeFinder<'ast> {
    /// How many function bodies we are nested within
    depth: usize,
    table: SymbolTable<EscapeEntry<'ast>>,
}

impl<'ast> EscapeFinder<'ast> {
    fn declare(&mut self, symbol: InternedSymbol, escape: &'ast Escape) {
        self.table.enter(
            symbol,
            EscapeEntry {
                depth: self.depth,
                escape,
            },
        );
    }
}

impl<'ast> Visitor<'ast> for EscapeFinder<'ast> {
    fn visit_expression(&mut self, expression: &'ast Expression) {
        match &expression.kind {
            ExpressionKind::For {
                variable,
                escape,
                low,
                high,
                body,
            } => {
                self.visit_expression(low);
                self.visit_expression(high);

                self.table.begin_scope();
                self.declare(variable.symbol, escape);
                self.visit_expression(body);
                self.table.end_scope();
            }
            ExpressionKind::Let { declarations, body } => {
                self.table.begin_scope();

                for declaration in declarations {
                    self.visit_declaration(declaration);
                }

                self.visit_expression(body);
                self.table.end_scope();
            }
            _ => visit::walk_expression(self, expression),
        }
    }

    fn visit_variable(&mut self, variable: &'ast Variable) {
        match &variable.kind {
            VariableKind::Simple(identifier) => {
                if let Some(entry) = self.table.lookup(identifier.symbol) {
                    if entry.depth < self.depth {
                        entry.escape.mark();
                    }
                }
            }
            _ => visit::walk_variable(self, variable),
        }
    }

    fn visit_function_declaration(&mut self, function: &'ast FunctionDeclaration) {
        self.depth += 1;
        self.table.begin_scope();

        for parameter in &function.parameters {
            self.declare(parameter.name.symbol, &parameter.escape);
        }

        self.visit_expression(&function.body);

        self.table.end_scope();
        self.depth -= 1;
    }

    fn visit_variable_declaration(&mut self, declaration: &'ast VariableDeclaration) {
        // The initializer sees the enclosing binding of the name, not this one
        self.visit_expression(&declaration.initializer);
        self.declare(declaration.name.symbol, &declaration.escape);
    }

    fn visit_type_declaration(&mut self, _declaration: &'ast TypeDeclaration) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Declaration, DeclarationKind, build::*};

    fn variable_escape(declaration: &Declaration) -> bool {
        match &declaration.kind {
            DeclarationKind::Variable(variable) => variable.escape.escapes(),
            _ => panic!("expected a variable declaration"),
        }
    }

    fn let_parts(expression: &Expression) -> (&[Declaration], &Expression) {
        match &expression.kind {
            ExpressionKind::Let { declarations, body } => (declarations.as_slice(), &**body),
            _ => panic!("expected a let expression"),
        }
    }

    #[test]
    fn variable_used_in_same_function_does_not_escape() {
        let program = let_in(vec![var_decl("x", None, int(0))], var("x"));
        find_escapes(&program);

        let (declarations, _) = let_parts(&program);
        assert!(!variable_escape(&declarations[0]));
    }

    #[test]
    fn variable_used_in_nested_function_escapes() {
        let program = let_in(
            vec![
                var_decl("x", None, int(0)),
                functions(vec![function("f", &[], Some("int"), var("x"))]),
            ],
            call("f", vec![]),
        );
        find_escapes(&program);

        let (declarations, _) = let_parts(&program);
        assert!(variable_escape(&declarations[0]));
    }

    #[test]
    fn shadowing_declaration_captures_the_reference() {
        // let var x := 0 function f() = let var x := 1 in x end in end
        let program = let_in(
            vec![
                var_decl("x", None, int(0)),
                functions(vec![function(
                    "f",
                    &[],
                    Some("int"),
                    let_in(vec![var_decl("x", None, int(1))], var("x")),
                )]),
            ],
            call("f", vec![]),
        );
        find_escapes(&program);

        let (declarations, _) = let_parts(&program);
        assert!(!variable_escape(&declarations[0]));

        let DeclarationKind::Functions(functions) = &declarations[1].kind else {
            panic!("expected a function batch");
        };
        let (inner, _) = let_parts(&functions[0].body);
        assert!(!variable_escape(&inner[0]));
    }

    #[test]
    fn parameter_used_by_inner_function_escapes() {
        let program = let_in(
            vec![functions(vec![function(
                "outer",
                &[("a", "int"), ("b", "int")],
                Some("int"),
                let_in(
                    vec![functions(vec![function("inner", &[], Some("int"), var("a"))])],
                    add(call("inner", vec![]), var("b")),
                ),
            )])],
            call("outer", vec![int(1), int(2)]),
        );
        find_escapes(&program);

        let (declarations, _) = let_parts(&program);
        let DeclarationKind::Functions(functions) = &declarations[0].kind else {
            panic!("expected a function batch");
        };
        let parameters = &functions[0].parameters;

        assert!(parameters[0].escape.escapes());
        assert!(!parameters[1].escape.escapes());
    }

    #[test]
    fn for_index_escapes_through_nested_function() {
        let program = for_loop(
            "i",
            int(0),
            int(10),
            let_in(
                vec![functions(vec![function(
                    "show",
                    &[],
                    None,
                    call("print", vec![call("chr", vec![var("i")])]),
                )])],
                call("show", vec![]),
            ),
        );
        find_escapes(&program);

        let ExpressionKind::For { escape, .. } = &program.kind else {
            panic!("expected a for loop");
        };
        assert!(escape.escapes());
    }

    #[test]
    fn initializer_refers_to_enclosing_binding() {
        // let var x := 0 in let function f(): int = let var x := x in x end in f() end end
        let program = let_in(
            vec![var_decl("x", None, int(0))],
            let_in(
                vec![functions(vec![function(
                    "f",
                    &[],
                    Some("int"),
                    let_in(vec![var_decl("x", None, var("x"))], var("x")),
                )])],
                call("f", vec![]),
            ),
        );
        find_escapes(&program);

        let (declarations, _) = let_parts(&program);
        assert!(variable_escape(&declarations[0]));
    }
}
