//! Semantic analysis
//!
//! Type checks the syntax tree and translates it to IR fragments in the same
//! pass. Errors do not stop the analysis: every error is recorded and
//! checking carries on with its siblings. A failed expression keeps its type
//! when that type is still known, such as the record type of a bad record
//! literal. Otherwise it stands in as `int` for values and `void` for
//! statements.

use crate::{
    frontend::{
        Position,
        ast::{
            self, BinaryOperatorClass, BinaryOperatorKind, Declaration, DeclarationKind,
            Expression, ExpressionKind, FunctionDeclaration, Identifier, TypeDeclaration,
            Variable, VariableDeclaration, VariableKind,
        },
        intern::InternedSymbol,
    },
    middle::{
        diagnostic::{Diagnostic, DiagnosticKind},
        env::{Binding, Environment},
        escape::find_escapes,
        frame::Fragment,
        ir::{self, BinaryOperator, RelationalOperator},
        temp::Label,
        translate::{CallTarget, LevelId, Translated, Translator},
        ty::{RecordField, Type, TypeKind},
    },
    target::CompileOptions,
};

/// Compiles a whole program to IR fragments. The main program is the last
/// fragment. If the program has any semantic errors, every one of them is
/// returned instead.
pub fn translate_program(
    program: &Expression,
    options: CompileOptions,
) -> Result<Vec<Fragment>, Vec<Diagnostic>> {
    find_escapes(program);

    let translator = Translator::new(options.target);
    let mut analyzer = Analyzer {
        environment: Environment::new(),
        level: translator.outermost(),
        translator,
        loop_exits: Vec::new(),
        diagnostics: Vec::new(),
    };

    let main = analyzer.translate_expression(program);

    if !analyzer.diagnostics.is_empty() {
        return Err(analyzer.diagnostics);
    }

    let returns_value = !main.ty.is_void();
    Ok(analyzer.translator.finish(main.translated, returns_value))
}

/// A translated expression together with its (actual) type
struct Typed {
    translated: Translated,
    ty: Type,
}

impl Typed {
    fn new(translated: Translated, ty: Type) -> Self {
        Self { translated, ty }
    }

    /// Stand-in for a value which failed to type check
    fn error() -> Self {
        Self::new(Translated::Value(ir::Expression::Constant(0)), Type::int())
    }

    /// Stand-in for a value of a known type whose parts failed to type check
    fn recovered(ty: Type) -> Self {
        Self::new(Translated::Value(ir::Expression::Constant(0)), ty)
    }

    /// Stand-in for a statement which failed to type check
    fn void_error() -> Self {
        Self::new(Translated::no_op(), Type::void())
    }
}

struct Analyzer {
    environment: Environment,
    translator: Translator,
    /// The level of the function whose body is being analyzed
    level: LevelId,
    /// Exit labels of the loops enclosing the current expression, innermost
    /// last. Emptied on entry to a function body.
    loop_exits: Vec<Label>,
    diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    fn report(&mut self, position: Position, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic::new(position, kind));
    }

    /// Looks up a type name without resolving it, which would be premature
    /// while a batch of type declarations is still being bound
    fn lookup_type(&mut self, identifier: &Identifier) -> Type {
        match self.environment.types.lookup(identifier.symbol) {
            Some(ty) => ty.clone(),
            None => {
                self.report(
                    identifier.position,
                    DiagnosticKind::UndefinedType(identifier.symbol),
                );
                Type::int()
            }
        }
    }

    fn translate_expression(&mut self, expression: &Expression) -> Typed {
        match &expression.kind {
            ExpressionKind::Nil => Typed::new(self.translator.nil(), Type::nil()),
            ExpressionKind::Integer(value) => {
                Typed::new(self.translator.integer(*value), Type::int())
            }
            ExpressionKind::String(text) => {
                Typed::new(self.translator.string(text), Type::string())
            }
            ExpressionKind::Variable(variable) => self.translate_variable(variable),
            ExpressionKind::Call {
                function,
                arguments,
            } => self.translate_call(expression.position, function, arguments),
            ExpressionKind::Binary { lhs, operator, rhs } => {
                self.translate_binary(expression.position, lhs, operator.kind, rhs)
            }
            ExpressionKind::Record { ty, fields } => {
                self.translate_record(expression.position, ty, fields)
            }
            ExpressionKind::Array {
                ty,
                size,
                initializer,
            } => self.translate_array(ty, size, initializer),
            ExpressionKind::Sequence(expressions) => {
                let mut ty = Type::void();
                let mut items = Vec::with_capacity(expressions.len());

                for expression in expressions {
                    let typed = self.translate_expression(expression);
                    ty = typed.ty;
                    items.push(typed.translated);
                }

                Typed::new(self.translator.sequence(items), ty)
            }
            ExpressionKind::If {
                condition,
                positive,
                negative,
            } => self.translate_if(expression.position, condition, positive, negative.as_deref()),
            ExpressionKind::While { condition, body } => {
                let condition = self.translate_condition(condition);
                let done = self.translator.new_loop_exit();

                self.loop_exits.push(done);
                let body = self.translate_loop_body(body);
                self.loop_exits.pop();

                Typed::new(
                    self.translator.while_loop(condition, body, done),
                    Type::void(),
                )
            }
            ExpressionKind::For {
                variable,
                escape,
                low,
                high,
                body,
            } => {
                let low = self.translate_bound(low);
                let high = self.translate_bound(high);

                self.environment.begin_scope();

                let index = self.translator.alloc_local(self.level, escape.escapes());
                self.environment.values.enter(
                    variable.symbol,
                    Binding::Variable {
                        access: index,
                        ty: Type::int(),
                        is_loop_index: true,
                    },
                );

                let done = self.translator.new_loop_exit();
                self.loop_exits.push(done);
                let body = self.translate_loop_body(body);
                self.loop_exits.pop();

                self.environment.end_scope();

                Typed::new(
                    self.translator.for_loop(index, low, high, body, done),
                    Type::void(),
                )
            }
            ExpressionKind::Break => match self.loop_exits.last() {
                Some(&done) => Typed::new(self.translator.break_loop(done), Type::void()),
                None => {
                    self.report(expression.position, DiagnosticKind::BreakOutsideLoop);
                    Typed::void_error()
                }
            },
            ExpressionKind::Let { declarations, body } => {
                self.environment.begin_scope();

                let mut items = Vec::new();
                for declaration in declarations {
                    self.translate_declaration(declaration, &mut items);
                }

                let body = self.translate_expression(body);
                items.push(body.translated);

                self.environment.end_scope();

                Typed::new(self.translator.sequence(items), body.ty)
            }
            ExpressionKind::Assignment { variable, value } => {
                if let VariableKind::Simple(identifier) = &variable.kind {
                    let is_loop_index = matches!(
                        self.environment.values.lookup(identifier.symbol),
                        Some(Binding::Variable {
                            is_loop_index: true,
                            ..
                        })
                    );

                    if is_loop_index {
                        self.report(
                            variable.position,
                            DiagnosticKind::AssignToLoopVariable(identifier.symbol),
                        );
                    }
                }

                let destination = self.translate_variable(variable);
                let value = self.translate_expression(value);

                if !destination.ty.matches(&value.ty) {
                    self.report(
                        expression.position,
                        DiagnosticKind::AssignmentMismatch {
                            expected: destination.ty,
                            actual: value.ty,
                        },
                    );
                    return Typed::void_error();
                }

                Typed::new(
                    self.translator
                        .assignment(destination.translated, value.translated),
                    Type::void(),
                )
            }
        }
    }

    fn translate_variable(&mut self, variable: &Variable) -> Typed {
        match &variable.kind {
            VariableKind::Simple(identifier) => {
                match self.environment.values.lookup(identifier.symbol) {
                    Some(Binding::Variable { access, ty, .. }) => {
                        let ty = ty.actual();
                        let translated = self.translator.simple_variable(*access, self.level);

                        Typed::new(translated, ty)
                    }
                    Some(Binding::Function { .. }) => {
                        self.report(
                            variable.position,
                            DiagnosticKind::NotAVariable(identifier.symbol),
                        );
                        Typed::error()
                    }
                    None => {
                        self.report(
                            variable.position,
                            DiagnosticKind::UndefinedVariable(identifier.symbol),
                        );
                        Typed::error()
                    }
                }
            }
            VariableKind::Field { record, field } => {
                let Typed { translated, ty } = self.translate_variable(record);

                let TypeKind::Record(fields) = &*ty else {
                    self.report(variable.position, DiagnosticKind::NotARecord(ty.clone()));
                    return Typed::error();
                };

                let Some((index, RecordField { ty: field_ty, .. })) = fields
                    .iter()
                    .enumerate()
                    .find(|(_, candidate)| candidate.name == field.symbol)
                else {
                    self.report(variable.position, DiagnosticKind::NoSuchField(field.symbol));
                    return Typed::error();
                };

                let field_ty = field_ty.actual();
                Typed::new(self.translator.field_variable(translated, index), field_ty)
            }
            VariableKind::Subscript { array, index } => {
                let array_position = array.position;
                let Typed { translated, ty } = self.translate_variable(array);
                let subscript = self.translate_expression(index);

                let TypeKind::Array(element) = &*ty else {
                    self.report(array_position, DiagnosticKind::NotAnArray(ty.clone()));
                    return Typed::error();
                };

                let element = element.actual();

                if !subscript.ty.is_int() {
                    self.report(index.position, DiagnosticKind::SubscriptNotInt(subscript.ty));
                    return Typed::recovered(element);
                }

                Typed::new(
                    self.translator
                        .subscript_variable(translated, subscript.translated),
                    element,
                )
            }
        }
    }

    fn translate_call(
        &mut self,
        position: Position,
        function: &Identifier,
        arguments: &[Expression],
    ) -> Typed {
        let (formals, result, target) = match self.environment.values.lookup(function.symbol) {
            Some(Binding::Function {
                formals,
                result,
                target,
            }) => (formals.clone(), result.clone(), *target),
            Some(Binding::Variable { .. }) => {
                self.report(position, DiagnosticKind::NotAFunction(function.symbol));
                return Typed::error();
            }
            None => {
                self.report(position, DiagnosticKind::UndefinedFunction(function.symbol));
                return Typed::error();
            }
        };

        let mut translated = Vec::with_capacity(arguments.len());

        for (i, argument) in arguments.iter().enumerate() {
            let typed = self.translate_expression(argument);

            match formals.get(i) {
                Some(expected) if !expected.matches(&typed.ty) => {
                    self.report(
                        argument.position,
                        DiagnosticKind::ArgumentType {
                            function: function.symbol,
                            index: i + 1,
                            expected: expected.actual(),
                            actual: typed.ty,
                        },
                    );
                }
                _ => {}
            }

            translated.push(typed.translated);
        }

        if arguments.len() < formals.len() {
            self.report(
                position,
                DiagnosticKind::TooFewArguments {
                    function: function.symbol,
                    expected: formals.len(),
                    actual: arguments.len(),
                },
            );
        } else if arguments.len() > formals.len() {
            self.report(
                position,
                DiagnosticKind::TooManyArguments {
                    function: function.symbol,
                    expected: formals.len(),
                    actual: arguments.len(),
                },
            );
        }

        Typed::new(
            self.translator.call(target, self.level, translated),
            result.actual(),
        )
    }

    fn translate_binary(
        &mut self,
        position: Position,
        lhs: &Expression,
        operator: BinaryOperatorKind,
        rhs: &Expression,
    ) -> Typed {
        let left = self.translate_expression(lhs);
        let right = self.translate_expression(rhs);

        match operator.class() {
            BinaryOperatorClass::Arithmetic | BinaryOperatorClass::Logical => {
                let mut valid = true;

                for (operand, typed) in [(lhs, &left), (rhs, &right)] {
                    if !typed.ty.is_int() {
                        self.report(operand.position, DiagnosticKind::IntegerRequired(operator));
                        valid = false;
                    }
                }

                if !valid {
                    return Typed::error();
                }

                let translated = match operator {
                    BinaryOperatorKind::And => {
                        self.translator.logical_and(left.translated, right.translated)
                    }
                    BinaryOperatorKind::Or => {
                        self.translator.logical_or(left.translated, right.translated)
                    }
                    _ => self.translator.arithmetic(
                        arithmetic_operator(operator),
                        left.translated,
                        right.translated,
                    ),
                };

                Typed::new(translated, Type::int())
            }
            BinaryOperatorClass::Equality | BinaryOperatorClass::Comparison => {
                if !left.ty.matches(&right.ty) {
                    self.report(
                        position,
                        DiagnosticKind::OperandMismatch {
                            lhs: left.ty,
                            rhs: right.ty,
                        },
                    );
                    return Typed::error();
                }

                if operator.class() == BinaryOperatorClass::Comparison
                    && !left.ty.is_int()
                    && !left.ty.is_string()
                {
                    self.report(
                        position,
                        DiagnosticKind::InvalidComparisonOperand(left.ty),
                    );
                    return Typed::error();
                }

                let operator = relational_operator(operator);
                let translated = if left.ty.is_string() {
                    self.translator
                        .string_comparison(operator, left.translated, right.translated)
                } else {
                    self.translator
                        .comparison(operator, left.translated, right.translated)
                };

                Typed::new(translated, Type::int())
            }
        }
    }

    fn translate_record(
        &mut self,
        position: Position,
        ty: &Identifier,
        initializers: &[ast::FieldInitializer],
    ) -> Typed {
        let record = self.lookup_type(ty).actual();
        let fields = match &*record {
            TypeKind::Record(fields) => Some(fields.clone()),
            _ => {
                if self.environment.types.lookup(ty.symbol).is_some() {
                    self.report(ty.position, DiagnosticKind::NotARecordType(ty.symbol));
                }
                None
            }
        };

        let mut values = Vec::with_capacity(initializers.len());
        let mut valid = fields.is_some();

        for (i, initializer) in initializers.iter().enumerate() {
            let value = self.translate_expression(&initializer.value);

            if let Some(field) = fields.as_ref().and_then(|fields| fields.get(i)) {
                if field.name != initializer.name.symbol {
                    self.report(
                        initializer.position,
                        DiagnosticKind::FieldName {
                            expected: field.name,
                            actual: initializer.name.symbol,
                        },
                    );
                    valid = false;
                } else if !field.ty.matches(&value.ty) {
                    self.report(
                        initializer.position,
                        DiagnosticKind::FieldType {
                            field: field.name,
                            expected: field.ty.actual(),
                            actual: value.ty,
                        },
                    );
                    valid = false;
                }
            }

            values.push(value.translated);
        }

        let expected = fields.as_ref().map(Vec::len);

        if let Some(expected) = expected.filter(|&expected| expected != initializers.len()) {
            self.report(
                position,
                DiagnosticKind::FieldCount {
                    expected,
                    actual: initializers.len(),
                },
            );
            valid = false;
        }

        match fields {
            None => Typed::error(),
            Some(_) if !valid => Typed::recovered(record),
            Some(_) => Typed::new(self.translator.record(values), record),
        }
    }

    fn translate_array(
        &mut self,
        ty: &Identifier,
        size: &Expression,
        initializer: &Expression,
    ) -> Typed {
        let array = self.lookup_type(ty).actual();
        let count = self.translate_expression(size);
        let value = self.translate_expression(initializer);

        let TypeKind::Array(element) = &*array else {
            if self.environment.types.lookup(ty.symbol).is_some() {
                self.report(ty.position, DiagnosticKind::NotAnArrayType(ty.symbol));
            }
            return Typed::error();
        };

        let mut valid = true;

        if !count.ty.is_int() {
            self.report(size.position, DiagnosticKind::ArraySizeNotInt(count.ty));
            valid = false;
        }

        if !element.matches(&value.ty) {
            self.report(
                initializer.position,
                DiagnosticKind::ArrayInitializerType {
                    expected: element.actual(),
                    actual: value.ty,
                },
            );
            valid = false;
        }

        if !valid {
            return Typed::recovered(array.clone());
        }

        Typed::new(
            self.translator.array(count.translated, value.translated),
            array.clone(),
        )
    }

    fn translate_if(
        &mut self,
        position: Position,
        condition: &Expression,
        positive: &Expression,
        negative: Option<&Expression>,
    ) -> Typed {
        let condition = self.translate_condition(condition);
        let then = self.translate_expression(positive);

        let Some(negative) = negative else {
            if !then.ty.is_void() {
                self.report(
                    positive.position,
                    DiagnosticKind::IfWithoutElseNotVoid(then.ty),
                );
                return Typed::void_error();
            }

            return Typed::new(
                self.translator.if_then(condition, then.translated),
                Type::void(),
            );
        };

        let otherwise = self.translate_expression(negative);

        if !then.ty.matches(&otherwise.ty) {
            self.report(
                position,
                DiagnosticKind::IfBranchMismatch {
                    positive: then.ty.clone(),
                    negative: otherwise.ty.clone(),
                },
            );

            let ty = if then.ty.is_nil() { otherwise.ty } else { then.ty };
            return if ty.is_void() {
                Typed::void_error()
            } else {
                Typed::recovered(ty)
            };
        }

        // `if c then nil else r` has the type of `r`
        let ty = if then.ty.is_nil() { otherwise.ty } else { then.ty };
        let produces_value = !ty.is_void();

        Typed::new(
            self.translator.if_then_else(
                condition,
                then.translated,
                otherwise.translated,
                produces_value,
            ),
            ty,
        )
    }

    /// Conditions must be integers. A bad condition is replaced by a constant
    /// so that translation can continue.
    fn translate_condition(&mut self, condition: &Expression) -> Translated {
        let typed = self.translate_expression(condition);

        if !typed.ty.is_int() {
            self.report(condition.position, DiagnosticKind::ConditionNotInt(typed.ty));
            return self.translator.integer(0);
        }

        typed.translated
    }

    fn translate_bound(&mut self, bound: &Expression) -> Translated {
        let typed = self.translate_expression(bound);

        if !typed.ty.is_int() {
            self.report(bound.position, DiagnosticKind::ForBoundNotInt(typed.ty));
            return self.translator.integer(0);
        }

        typed.translated
    }

    fn translate_loop_body(&mut self, body: &Expression) -> Translated {
        let typed = self.translate_expression(body);

        if !typed.ty.is_void() {
            self.report(body.position, DiagnosticKind::LoopBodyNotVoid(typed.ty));
        }

        typed.translated
    }

    /// Binds the names a declaration introduces in the current scope. Variable
    /// initialization code is appended to `initializers`.
    fn translate_declaration(
        &mut self,
        declaration: &Declaration,
        initializers: &mut Vec<Translated>,
    ) {
        match &declaration.kind {
            DeclarationKind::Functions(functions) => self.translate_functions(functions),
            DeclarationKind::Types(types) => self.translate_types(types),
            DeclarationKind::Variable(variable) => {
                let initializer =
                    self.translate_variable_declaration(declaration.position, variable);
                initializers.push(initializer);
            }
        }
    }

    fn translate_variable_declaration(
        &mut self,
        position: Position,
        declaration: &VariableDeclaration,
    ) -> Translated {
        let initializer = self.translate_expression(&declaration.initializer);

        let ty = match &declaration.ty {
            Some(explicit) => {
                let ty = self.lookup_type(explicit).actual();

                if !ty.matches(&initializer.ty) {
                    self.report(
                        declaration.initializer.position,
                        DiagnosticKind::VariableInitializer {
                            expected: ty.clone(),
                            actual: initializer.ty.clone(),
                        },
                    );
                }

                ty
            }
            None if initializer.ty.is_nil() => {
                self.report(position, DiagnosticKind::NilWithoutType);
                Type::int()
            }
            None if initializer.ty.is_void() => {
                self.report(position, DiagnosticKind::VoidInitializer);
                Type::int()
            }
            None => initializer.ty.clone(),
        };

        let access = self
            .translator
            .alloc_local(self.level, declaration.escape.escapes());

        self.environment.values.enter(
            declaration.name.symbol,
            Binding::Variable {
                access,
                ty,
                is_loop_index: false,
            },
        );

        let destination = self.translator.simple_variable(access, self.level);
        self.translator
            .assignment(destination, initializer.translated)
    }

    fn translate_types(&mut self, declarations: &[TypeDeclaration]) {
        report_redefinitions(
            &mut self.diagnostics,
            declarations.iter().map(|declaration| &declaration.name),
            DiagnosticKind::TypeRedefined,
        );

        // Placeholders first, so the declarations in this batch can refer to
        // each other
        let placeholders: Vec<Type> = declarations
            .iter()
            .map(|declaration| {
                let placeholder = Type::name(declaration.name.symbol);
                self.environment
                    .types
                    .enter(declaration.name.symbol, placeholder.clone());
                placeholder
            })
            .collect();

        for (declaration, placeholder) in declarations.iter().zip(&placeholders) {
            let definition = self.resolve_type(&declaration.ty);
            placeholder.bind(definition);
        }

        for (declaration, placeholder) in declarations.iter().zip(&placeholders) {
            if placeholder.actual().is_name() {
                self.report(
                    declaration.position,
                    DiagnosticKind::InfiniteRecursiveType(declaration.name.symbol),
                );
                placeholder.bind(Type::int());
            }
        }
    }

    fn resolve_type(&mut self, ty: &ast::Type) -> Type {
        match &ty.kind {
            ast::TypeKind::Name(name) => self.lookup_type(name),
            ast::TypeKind::Record(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| RecordField {
                        name: field.name.symbol,
                        ty: self.lookup_type(&field.ty),
                    })
                    .collect();

                Type::record(fields)
            }
            ast::TypeKind::Array(element) => Type::array(self.lookup_type(element)),
        }
    }

    fn translate_functions(&mut self, declarations: &[FunctionDeclaration]) {
        report_redefinitions(
            &mut self.diagnostics,
            declarations.iter().map(|declaration| &declaration.name),
            DiagnosticKind::FunctionRedefined,
        );

        // Register every signature before any body so that the functions in
        // this batch can call each other
        let mut signatures = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            let formals: Vec<Type> = declaration
                .parameters
                .iter()
                .map(|parameter| self.lookup_type(&parameter.ty))
                .collect();
            let result = match &declaration.result {
                Some(result) => self.lookup_type(result),
                None => Type::void(),
            };

            let escapes: Vec<bool> = declaration
                .parameters
                .iter()
                .map(|parameter| parameter.escape.escapes())
                .collect();
            let label = self.translator.new_function_label(declaration.name.symbol);
            let level = self.translator.new_level(self.level, label, &escapes);

            self.environment.values.enter(
                declaration.name.symbol,
                Binding::Function {
                    formals: formals.clone(),
                    result: result.clone(),
                    target: CallTarget::Function { level, label },
                },
            );

            signatures.push((level, formals, result));
        }

        for (declaration, (level, formals, result)) in declarations.iter().zip(signatures) {
            self.translate_function_body(declaration, level, formals, result);
        }
    }

    fn translate_function_body(
        &mut self,
        declaration: &FunctionDeclaration,
        level: LevelId,
        formals: Vec<Type>,
        result: Type,
    ) {
        self.environment.begin_scope();

        let accesses = self.translator.formals(level);
        for ((parameter, access), ty) in declaration.parameters.iter().zip(accesses).zip(formals) {
            self.environment.values.enter(
                parameter.name.symbol,
                Binding::Variable {
                    access,
                    ty,
                    is_loop_index: false,
                },
            );
        }

        let enclosing_level = std::mem::replace(&mut self.level, level);
        let enclosing_loops = std::mem::take(&mut self.loop_exits);

        let body = self.translate_expression(&declaration.body);

        if !result.matches(&body.ty) {
            self.report(
                declaration.body.position,
                DiagnosticKind::FunctionBodyType {
                    expected: result.actual(),
                    actual: body.ty,
                },
            );
        }

        self.translator
            .procedure(level, body.translated, !result.actual().is_void());

        self.level = enclosing_level;
        self.loop_exits = enclosing_loops;
        self.environment.end_scope();
    }
}

/// Reports every name in a declaration batch which repeats an earlier one
fn report_redefinitions<'a>(
    diagnostics: &mut Vec<Diagnostic>,
    names: impl Iterator<Item = &'a Identifier>,
    kind: fn(InternedSymbol) -> DiagnosticKind,
) {
    let mut seen = hashbrown::HashSet::new();

    for name in names {
        if !seen.insert(name.symbol) {
            diagnostics.push(Diagnostic::new(name.position, kind(name.symbol)));
        }
    }
}

fn arithmetic_operator(operator: BinaryOperatorKind) -> BinaryOperator {
    match operator {
        BinaryOperatorKind::Add => BinaryOperator::Plus,
        BinaryOperatorKind::Subtract => BinaryOperator::Minus,
        BinaryOperatorKind::Multiply => BinaryOperator::Times,
        BinaryOperatorKind::Divide => BinaryOperator::Divide,
        _ => unreachable!("{operator} is not an arithmetic operator"),
    }
}

fn relational_operator(operator: BinaryOperatorKind) -> RelationalOperator {
    match operator {
        BinaryOperatorKind::Equals => RelationalOperator::Eq,
        BinaryOperatorKind::NotEquals => RelationalOperator::Ne,
        BinaryOperatorKind::LessThan => RelationalOperator::Lt,
        BinaryOperatorKind::LessThanOrEqualTo => RelationalOperator::Le,
        BinaryOperatorKind::GreaterThan => RelationalOperator::Gt,
        BinaryOperatorKind::GreaterThanOrEqualTo => RelationalOperator::Ge,
        _ => unreachable!("{operator} is not a relational operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frontend::ast::build::*,
        middle::{frame::FrameAccess, ir::pretty_print::format_fragments},
    };

    fn analyze(program: Expression) -> Result<Vec<Fragment>, Vec<Diagnostic>> {
        translate_program(&program, CompileOptions::default())
    }

    fn diagnostics(program: Expression) -> Vec<Diagnostic> {
        analyze(program).expect_err("program should be rejected")
    }

    fn unit() -> Expression {
        seq(vec![])
    }

    #[test]
    fn mutually_recursive_functions_type_check() {
        // let
        //   function even(n: int): int = if n = 0 then 1 else odd(n - 1)
        //   function odd(n: int): int = if n = 0 then 0 else even(n - 1)
        // in even(10) end
        let program = let_in(
            vec![functions(vec![
                function(
                    "even",
                    &[("n", "int")],
                    Some("int"),
                    if_else(
                        eq(var("n"), int(0)),
                        int(1),
                        call("odd", vec![sub(var("n"), int(1))]),
                    ),
                ),
                function(
                    "odd",
                    &[("n", "int")],
                    Some("int"),
                    if_else(
                        eq(var("n"), int(0)),
                        int(0),
                        call("even", vec![sub(var("n"), int(1))]),
                    ),
                ),
            ])],
            call("even", vec![int(10)]),
        );

        let fragments = analyze(program).expect("program should type check");
        let labels: Vec<String> = fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Procedure { frame, .. } => frame.label.to_string(),
                Fragment::StringLiteral { .. } => panic!("no strings in this program"),
            })
            .collect();

        assert_eq!(labels.len(), 3);
        assert!(labels[0].starts_with("even_"));
        assert!(labels[1].starts_with("odd_"));
        assert_eq!(labels[2], "tigermain");
    }

    #[test]
    fn undefined_variable_is_reported_once() {
        let diagnostics = diagnostics(add(at(1, 5, var("x")), int(1)));

        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::UndefinedVariable(name) if name.value() == "x"
        ));
        assert_eq!(diagnostics[0].to_string(), "1.5: undefined variable 'x'");
    }

    #[test]
    fn errors_do_not_stop_sibling_checks() {
        let diagnostics = diagnostics(seq(vec![var("a"), call("nope", vec![]), var("b")]));

        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn cyclic_type_aliases_are_rejected() {
        let program = let_in(
            vec![types(vec![alias_type("a", "b"), alias_type("b", "a")])],
            unit(),
        );

        assert!(diagnostics(program).iter().any(|diagnostic| matches!(
            diagnostic.kind,
            DiagnosticKind::InfiniteRecursiveType(_)
        )));
    }

    #[test]
    fn nil_initializes_an_explicitly_typed_record() {
        // let type R = { x: int } var r: R := nil in r.x end
        let program = let_in(
            vec![
                types(vec![record_type("R", &[("x", "int")])]),
                var_decl("r", Some("R"), nil()),
            ],
            read(field_of(simple("r"), "x")),
        );

        assert!(analyze(program).is_ok());
    }

    #[test]
    fn recursive_records_resolve_through_names() {
        // let
        //   type list = { head: int, tail: list }
        //   var l := list { head = 1, tail = nil }
        // in l.tail.head end
        let program = let_in(
            vec![
                types(vec![record_type("list", &[("head", "int"), ("tail", "list")])]),
                var_decl(
                    "l",
                    None,
                    record("list", vec![("head", int(1)), ("tail", nil())]),
                ),
            ],
            read(field_of(field_of(simple("l"), "tail"), "head")),
        );

        assert!(analyze(program).is_ok());
    }

    #[test]
    fn wrong_argument_type_is_reported_at_the_argument() {
        // let function f(a: int): int = a in f("no") end
        let program = let_in(
            vec![functions(vec![function(
                "f",
                &[("a", "int")],
                Some("int"),
                var("a"),
            )])],
            call("f", vec![at(3, 7, string("no"))]),
        );

        let diagnostics = diagnostics(program);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].position, Position::new(3, 7));
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::ArgumentType { index: 1, .. }
        ));
    }

    #[test]
    fn builtin_arity_is_checked() {
        let diagnostics = diagnostics(call("print", vec![]));

        assert!(matches!(
            diagnostics[..],
            [Diagnostic {
                kind: DiagnosticKind::TooFewArguments {
                    expected: 1,
                    actual: 0,
                    ..
                },
                ..
            }]
        ));
    }

    #[test]
    fn for_index_cannot_be_assigned() {
        let program = for_loop("i", int(0), int(10), assign(simple("i"), int(1)));

        let diagnostics = diagnostics(program);

        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::AssignToLoopVariable(_)
        ));
    }

    #[test]
    fn break_must_be_inside_a_loop_of_the_same_function() {
        assert!(analyze(while_loop(int(1), break_loop())).is_ok());

        assert!(matches!(
            diagnostics(break_loop())[0].kind,
            DiagnosticKind::BreakOutsideLoop
        ));

        // while 1 do let function f() = break in () end
        let program = while_loop(
            int(1),
            let_in(
                vec![functions(vec![function("f", &[], None, break_loop())])],
                unit(),
            ),
        );
        assert!(matches!(
            diagnostics(program)[..],
            [Diagnostic {
                kind: DiagnosticKind::BreakOutsideLoop,
                ..
            }]
        ));
    }

    #[test]
    fn names_in_a_batch_must_be_unique() {
        let program = let_in(
            vec![
                functions(vec![
                    function("f", &[], None, unit()),
                    function("f", &[], None, unit()),
                ]),
                types(vec![alias_type("t", "int"), alias_type("t", "string")]),
            ],
            unit(),
        );

        let diagnostics = diagnostics(program);

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(diagnostics[0].kind, DiagnosticKind::FunctionRedefined(_)));
        assert!(matches!(diagnostics[1].kind, DiagnosticKind::TypeRedefined(_)));
    }

    #[test]
    fn untyped_variables_need_a_known_type() {
        let from_nil = let_in(vec![var_decl("x", None, nil())], unit());
        assert!(matches!(
            diagnostics(from_nil)[0].kind,
            DiagnosticKind::NilWithoutType
        ));

        let from_void = let_in(vec![var_decl("x", None, unit())], unit());
        assert!(matches!(
            diagnostics(from_void)[0].kind,
            DiagnosticKind::VoidInitializer
        ));
    }

    #[test]
    fn record_fields_must_be_given_in_order() {
        let program = let_in(
            vec![types(vec![record_type("R", &[("a", "int"), ("b", "int")])])],
            record("R", vec![("b", int(1)), ("a", int(2))]),
        );

        assert!(
            diagnostics(program)
                .iter()
                .all(|diagnostic| matches!(diagnostic.kind, DiagnosticKind::FieldName { .. }))
        );
    }

    #[test]
    fn logical_operators_require_integers() {
        // if 1 < 2 & 3 = 3 then print("yes")
        let valid = if_then(
            binary(
                lt(int(1), int(2)),
                BinaryOperatorKind::And,
                eq(int(3), int(3)),
            ),
            call("print", vec![string("yes")]),
        );
        assert!(analyze(valid).is_ok());

        let invalid = binary(int(1), BinaryOperatorKind::Or, at(2, 9, string("no")));
        let diagnostics = diagnostics(invalid);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].position, Position::new(2, 9));
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::IntegerRequired(BinaryOperatorKind::Or)
        ));
    }

    #[test]
    fn loops_translate_to_jumps() {
        // for i := 0 to 3 do (while i < 2 do break; ())
        let program = for_loop(
            "i",
            int(0),
            int(3),
            seq(vec![while_loop(lt(var("i"), int(2)), break_loop()), unit()]),
        );

        let fragments = analyze(program).expect("program should type check");
        let text = strip_ansi_escapes::strip_str(format_fragments(&fragments));

        assert!(text.contains("CJUMP(LE"));
        assert!(text.contains("CJUMP(LT"));
        assert!(!text.contains("TEMP rv"));
    }

    #[test]
    fn if_branches_must_agree() {
        let diagnostics = diagnostics(if_else(int(1), int(2), string("x")));

        assert!(matches!(
            diagnostics[..],
            [Diagnostic {
                kind: DiagnosticKind::IfBranchMismatch { .. },
                ..
            }]
        ));
    }

    #[test]
    fn bad_record_field_keeps_the_record_type() {
        // let type R = { a: int } var r: R := R { a = "x" } in r.a end
        let program = let_in(
            vec![
                types(vec![record_type("R", &[("a", "int")])]),
                var_decl("r", Some("R"), record("R", vec![("a", string("x"))])),
            ],
            read(field_of(simple("r"), "a")),
        );

        assert!(matches!(
            diagnostics(program)[..],
            [Diagnostic {
                kind: DiagnosticKind::FieldType { .. },
                ..
            }]
        ));
    }

    #[test]
    fn mismatched_branches_keep_the_then_type() {
        // let var s: string := if 1 then "a" else 3 in s end
        let program = let_in(
            vec![var_decl(
                "s",
                Some("string"),
                if_else(int(1), string("a"), int(3)),
            )],
            var("s"),
        );

        assert!(matches!(
            diagnostics(program)[..],
            [Diagnostic {
                kind: DiagnosticKind::IfBranchMismatch { .. },
                ..
            }]
        ));
    }

    #[test]
    fn bad_array_initializer_keeps_the_array_type() {
        // let type A = array of int var a: A := A[10] of "x" in a[0] end
        let program = let_in(
            vec![
                types(vec![array_type("A", "int")]),
                var_decl("a", Some("A"), array("A", int(10), string("x"))),
            ],
            read(subscript(simple("a"), int(0))),
        );

        assert!(matches!(
            diagnostics(program)[..],
            [Diagnostic {
                kind: DiagnosticKind::ArrayInitializerType { .. },
                ..
            }]
        ));
    }

    #[test]
    fn subscripts_must_be_integers() {
        // let type A = array of int var a := A[3] of 0 in a["x"] + 1 end
        let program = let_in(
            vec![
                types(vec![array_type("A", "int")]),
                var_decl("a", None, array("A", int(3), int(0))),
            ],
            add(read(subscript(simple("a"), at(4, 7, string("x")))), int(1)),
        );

        let diagnostics = diagnostics(program);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].position, Position::new(4, 7));
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::SubscriptNotInt(ref ty) if ty.is_string()
        ));
    }

    #[test]
    fn only_arrays_can_be_subscripted() {
        // let var x := 3 in x[0] end
        let program = let_in(
            vec![var_decl("x", None, int(3))],
            read(subscript(simple("x"), int(0))),
        );

        assert!(matches!(
            diagnostics(program)[..],
            [Diagnostic {
                kind: DiagnosticKind::NotAnArray(ref ty),
                ..
            }] if ty.is_int()
        ));
    }

    #[test]
    fn arrays_are_created_and_indexed_by_words() {
        // let type A = array of int var a := A[3] of 0 in a[1] := 5; a[2] end
        let program = let_in(
            vec![
                types(vec![array_type("A", "int")]),
                var_decl("a", None, array("A", int(3), int(0))),
            ],
            seq(vec![
                assign(subscript(simple("a"), int(1)), int(5)),
                read(subscript(simple("a"), int(2))),
            ]),
        );

        let fragments = analyze(program).expect("program should type check");
        let text = strip_ansi_escapes::strip_str(format_fragments(&fragments));

        assert!(text.contains("NAME _InitArray"));
        assert_eq!(text.matches("BINOP(TIMES").count(), 2);
        assert!(text.contains("CONST 4"));
    }

    #[test]
    fn records_are_allocated_one_word_per_field() {
        // let type R = { a: int, b: int } in R { a = 1, b = 2 } end
        let program = let_in(
            vec![types(vec![record_type("R", &[("a", "int"), ("b", "int")])])],
            record("R", vec![("a", int(1)), ("b", int(2))]),
        );

        let fragments = analyze(program).expect("program should type check");
        let text = strip_ansi_escapes::strip_str(format_fragments(&fragments));

        assert!(text.contains("NAME _Alloc"));
        assert!(text.contains("CONST 8"));
    }

    #[test]
    fn captured_loop_index_lives_in_the_frame() {
        // for i := 0 to 3 do let function f(): int = i in f(); () end
        let program = for_loop(
            "i",
            int(0),
            int(3),
            let_in(
                vec![functions(vec![function("f", &[], Some("int"), var("i"))])],
                seq(vec![call("f", vec![]), unit()]),
            ),
        );

        let fragments = analyze(program).expect("program should type check");

        let Some(Fragment::Procedure { frame, .. }) = fragments.last() else {
            panic!("the main program should be the last fragment");
        };
        assert_eq!(frame.locals, vec![FrameAccess::InFrame(-12)]);
    }

    #[test]
    fn strings_compare_through_the_runtime() {
        let fragments = analyze(eq(string("a"), string("b"))).expect("strings are comparable");

        assert!(matches!(fragments[0], Fragment::StringLiteral { .. }));
        assert!(matches!(fragments[1], Fragment::StringLiteral { .. }));

        let text = strip_ansi_escapes::strip_str(format_fragments(&fragments));
        assert!(text.contains("NAME _CompareString"));
        assert!(text.contains("TEMP rv"));
    }

    #[test]
    fn captured_variables_live_in_the_frame() {
        // let var x := 0 function f(): int = x in f() end
        let program = let_in(
            vec![
                var_decl("x", None, int(0)),
                functions(vec![function("f", &[], Some("int"), var("x"))]),
            ],
            call("f", vec![]),
        );

        let fragments = analyze(program).expect("program should type check");

        let Some(Fragment::Procedure { frame, .. }) = fragments.last() else {
            panic!("the main program should be the last fragment");
        };
        assert_eq!(frame.locals, vec![FrameAccess::InFrame(-12)]);
    }
}
