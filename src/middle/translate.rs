//! Builds IR trees for the semantic analyzer. Translation happens in three
//! interchangeable shapes ([`Translated`]) so that control flow is only
//! linearized once the consumer of an expression decides what it needs.

use crate::{
    frontend::intern::InternedSymbol,
    index::{IndexVec, simple_index},
    middle::{
        frame::{self, Fragment, Frame, FrameAccess, RuntimeFunction},
        ir::{BinaryOperator, Expression, RelationalOperator, Statement},
        temp::{Label, Temp, TempFactory},
    },
    target::Target,
};

simple_index! {
    /// A function nesting level. Every Tiger function (and the main program)
    /// gets its own level.
    pub struct LevelId;
}

#[derive(Debug)]
pub struct Level {
    /// `None` only for the outermost level
    pub parent: Option<LevelId>,
    pub frame: Frame,
}

/// Where a variable lives, relative to the level that declared it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub level: LevelId,
    pub access: FrameAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// A runtime or built-in function. These take no static link.
    Runtime(Label),
    /// A Tiger function declared at `level`
    Function { level: LevelId, label: Label },
}

/// A conditional jump whose destinations are not known yet. The jumps point
/// at placeholder labels until the consumer binds them.
#[derive(Debug, Clone)]
pub struct PendingBranch {
    statement: Statement,
    trues: Vec<Label>,
    falses: Vec<Label>,
}

impl PendingBranch {
    fn new(statement: Statement, trues: Vec<Label>, falses: Vec<Label>) -> Self {
        Self {
            statement,
            trues,
            falses,
        }
    }

    fn patch_trues(&mut self, destination: Label) {
        let holes = std::mem::take(&mut self.trues);
        patch(&mut self.statement, &holes, destination);
    }

    fn patch_falses(&mut self, destination: Label) {
        let holes = std::mem::take(&mut self.falses);
        patch(&mut self.statement, &holes, destination);
    }

    /// Resolves every open jump and hands back the finished statement
    pub fn bind(mut self, positive: Label, negative: Label) -> Statement {
        self.patch_trues(positive);
        self.patch_falses(negative);
        self.statement
    }
}

fn patch(statement: &mut Statement, holes: &[Label], destination: Label) {
    if holes.is_empty() {
        return;
    }

    statement.map_labels(&mut |label| {
        if holes.contains(&label) {
            destination
        } else {
            label
        }
    });
}

#[derive(Debug, Clone)]
pub enum Translated {
    /// Computes a value
    Value(Expression),
    /// Computes no value
    Effect(Statement),
    /// Jumps to a true or false destination
    Conditional(PendingBranch),
}

impl Translated {
    /// Placeholder for expressions which failed to type check
    pub fn no_op() -> Self {
        Translated::Effect(Statement::Sequence(Vec::new()))
    }
}

/// Owns everything which has to be unique within one compilation: temps,
/// labels, levels and the fragments produced so far
#[derive(Debug)]
pub struct Translator {
    target: Target,
    temps: TempFactory,
    levels: IndexVec<LevelId, Level>,
    fragments: Vec<Fragment>,
    outermost: LevelId,
}

impl Translator {
    pub fn new(target: Target) -> Self {
        let mut temps = TempFactory::new();
        let mut levels = IndexVec::new();

        let frame = Frame::new(target, Label::named("tigermain"), &[true], &mut temps);
        let outermost = levels.push(Level {
            parent: None,
            frame,
        });

        Self {
            target,
            temps,
            levels,
            fragments: Vec::new(),
            outermost,
        }
    }

    pub fn outermost(&self) -> LevelId {
        self.outermost
    }

    pub fn new_function_label(&mut self, name: InternedSymbol) -> Label {
        self.temps.new_function_label(name)
    }

    /// Label a `break` inside the loop about to be translated jumps to
    pub fn new_loop_exit(&mut self) -> Label {
        self.temps.new_label()
    }

    /// Creates a level for a function nested in `parent`. The static link is
    /// added as an escaping formal 0 in front of `formal_escapes`.
    pub fn new_level(&mut self, parent: LevelId, label: Label, formal_escapes: &[bool]) -> LevelId {
        let escapes: Vec<bool> = std::iter::once(true)
            .chain(formal_escapes.iter().copied())
            .collect();
        let frame = Frame::new(self.target, label, &escapes, &mut self.temps);

        self.levels.push(Level {
            parent: Some(parent),
            frame,
        })
    }

    /// Accesses of the user visible formals of a level, excluding the static
    /// link
    pub fn formals(&self, level: LevelId) -> Vec<Access> {
        self.levels[level]
            .frame
            .formals
            .iter()
            .skip(1)
            .map(|&access| Access { level, access })
            .collect()
    }

    pub fn alloc_local(&mut self, level: LevelId, escapes: bool) -> Access {
        let access = self.levels[level].frame.alloc_local(escapes, &mut self.temps);

        Access { level, access }
    }

    /// Address of the frame belonging to `target`, as seen from code running
    /// at `from`. `target` must be `from` or one of its ancestors.
    fn frame_address(&self, from: LevelId, target: LevelId) -> Expression {
        let mut address = Expression::Temp(Temp::FRAME_POINTER);
        let mut current = from;

        while current != target {
            let level = &self.levels[current];
            address = level.frame.static_link().to_ir(address);

            let Some(parent) = level.parent else {
                unreachable!("{target:?} is not an ancestor of {from:?}");
            };
            current = parent;
        }

        address
    }

    fn word_size(&self) -> i64 {
        self.target.word_size()
    }

    pub fn into_value(&mut self, translated: Translated) -> Expression {
        match translated {
            Translated::Value(expression) => expression,
            // Undo a value that was only discarded
            Translated::Effect(Statement::Expression(expression)) => expression,
            Translated::Effect(statement) => {
                Expression::sequence(statement, Expression::Constant(0))
            }
            Translated::Conditional(branch) => {
                let result = self.temps.new_temp();
                let positive = self.temps.new_label();
                let negative = self.temps.new_label();
                let done = self.temps.new_label();

                let statement = Statement::Sequence(vec![
                    branch.bind(positive, negative),
                    Statement::Label(positive),
                    Statement::move_to(Expression::Temp(result), Expression::Constant(1)),
                    Statement::jump(done),
                    Statement::Label(negative),
                    Statement::move_to(Expression::Temp(result), Expression::Constant(0)),
                    Statement::Label(done),
                ]);

                Expression::sequence(statement, Expression::Temp(result))
            }
        }
    }

    pub fn into_effect(&mut self, translated: Translated) -> Statement {
        match translated {
            Translated::Value(expression) => Statement::Expression(expression),
            Translated::Effect(statement) => statement,
            Translated::Conditional(branch) => {
                let join = self.temps.new_label();

                Statement::Sequence(vec![branch.bind(join, join), Statement::Label(join)])
            }
        }
    }

    pub fn into_conditional(&mut self, translated: Translated) -> PendingBranch {
        match translated {
            Translated::Value(Expression::Constant(value)) => {
                let hole = self.temps.new_label();

                if value == 0 {
                    PendingBranch::new(Statement::jump(hole), Vec::new(), vec![hole])
                } else {
                    PendingBranch::new(Statement::jump(hole), vec![hole], Vec::new())
                }
            }
            Translated::Value(expression) => {
                let positive = self.temps.new_label();
                let negative = self.temps.new_label();

                let statement = Statement::ConditionalJump {
                    operator: RelationalOperator::Ne,
                    lhs: expression,
                    rhs: Expression::Constant(0),
                    positive,
                    negative,
                };

                PendingBranch::new(statement, vec![positive], vec![negative])
            }
            Translated::Effect(_) => {
                unreachable!("a statement without a value cannot be used as a condition")
            }
            Translated::Conditional(branch) => branch,
        }
    }

    pub fn integer(&self, value: i64) -> Translated {
        Translated::Value(Expression::Constant(value))
    }

    pub fn nil(&self) -> Translated {
        self.integer(0)
    }

    /// String literals are placed in their own fragment and referred to by
    /// address
    pub fn string(&mut self, text: &str) -> Translated {
        let label = self.temps.new_label();

        self.fragments.push(Fragment::StringLiteral {
            label,
            text: text.to_owned(),
        });

        Translated::Value(Expression::Name(label))
    }

    pub fn simple_variable(&self, access: Access, from: LevelId) -> Translated {
        let frame_pointer = self.frame_address(from, access.level);

        Translated::Value(access.access.to_ir(frame_pointer))
    }

    pub fn field_variable(&mut self, record: Translated, index: usize) -> Translated {
        let record = self.into_value(record);
        let offset = Expression::Constant(index as i64 * self.word_size());

        Translated::Value(Expression::memory(Expression::binary(
            BinaryOperator::Plus,
            record,
            offset,
        )))
    }

    pub fn subscript_variable(&mut self, array: Translated, index: Translated) -> Translated {
        let array = self.into_value(array);
        let index = self.into_value(index);
        let offset = Expression::binary(
            BinaryOperator::Times,
            index,
            Expression::Constant(self.word_size()),
        );

        Translated::Value(Expression::memory(Expression::binary(
            BinaryOperator::Plus,
            array,
            offset,
        )))
    }

    pub fn arithmetic(
        &mut self,
        operator: BinaryOperator,
        lhs: Translated,
        rhs: Translated,
    ) -> Translated {
        let lhs = self.into_value(lhs);
        let rhs = self.into_value(rhs);

        Translated::Value(Expression::binary(operator, lhs, rhs))
    }

    pub fn comparison(
        &mut self,
        operator: RelationalOperator,
        lhs: Translated,
        rhs: Translated,
    ) -> Translated {
        let lhs = self.into_value(lhs);
        let rhs = self.into_value(rhs);

        self.compare(operator, lhs, rhs)
    }

    /// Strings compare by contents through the runtime
    pub fn string_comparison(
        &mut self,
        operator: RelationalOperator,
        lhs: Translated,
        rhs: Translated,
    ) -> Translated {
        let lhs = self.into_value(lhs);
        let rhs = self.into_value(rhs);
        let ordering = frame::external_call(RuntimeFunction::CompareString.label(), vec![lhs, rhs]);

        self.compare(operator, ordering, Expression::Constant(0))
    }

    fn compare(
        &mut self,
        operator: RelationalOperator,
        lhs: Expression,
        rhs: Expression,
    ) -> Translated {
        let positive = self.temps.new_label();
        let negative = self.temps.new_label();

        let statement = Statement::ConditionalJump {
            operator,
            lhs,
            rhs,
            positive,
            negative,
        };

        Translated::Conditional(PendingBranch::new(statement, vec![positive], vec![negative]))
    }

    /// `lhs & rhs`, only evaluating `rhs` when `lhs` holds
    pub fn logical_and(&mut self, lhs: Translated, rhs: Translated) -> Translated {
        let mut lhs = self.into_conditional(lhs);
        let rhs = self.into_conditional(rhs);
        let next = self.temps.new_label();

        lhs.patch_trues(next);

        let mut falses = lhs.falses;
        falses.extend(rhs.falses);

        Translated::Conditional(PendingBranch::new(
            Statement::Sequence(vec![lhs.statement, Statement::Label(next), rhs.statement]),
            rhs.trues,
            falses,
        ))
    }

    /// `lhs | rhs`, only evaluating `rhs` when `lhs` does not hold
    pub fn logical_or(&mut self, lhs: Translated, rhs: Translated) -> Translated {
        let mut lhs = self.into_conditional(lhs);
        let rhs = self.into_conditional(rhs);
        let next = self.temps.new_label();

        lhs.patch_falses(next);

        let mut trues = lhs.trues;
        trues.extend(rhs.trues);

        Translated::Conditional(PendingBranch::new(
            Statement::Sequence(vec![lhs.statement, Statement::Label(next), rhs.statement]),
            trues,
            rhs.falses,
        ))
    }

    pub fn call(
        &mut self,
        target: CallTarget,
        from: LevelId,
        arguments: Vec<Translated>,
    ) -> Translated {
        let mut values: Vec<Expression> = Vec::with_capacity(arguments.len() + 1);

        let label = match target {
            CallTarget::Runtime(label) => label,
            CallTarget::Function { level, label } => {
                let Some(parent) = self.levels[level].parent else {
                    unreachable!("the outermost level cannot be called");
                };

                values.push(self.frame_address(from, parent));
                label
            }
        };

        for argument in arguments {
            let value = self.into_value(argument);
            values.push(value);
        }

        Translated::Value(frame::external_call(label, values))
    }

    /// Allocates a record on the heap and initializes every field in order
    pub fn record(&mut self, fields: Vec<Translated>) -> Translated {
        let result = self.temps.new_temp();
        let size = Expression::Constant(fields.len() as i64 * self.word_size());

        let mut statements = vec![Statement::move_to(
            Expression::Temp(result),
            frame::external_call(RuntimeFunction::Alloc.label(), vec![size]),
        )];

        for (i, field) in fields.into_iter().enumerate() {
            let value = self.into_value(field);
            let destination = Expression::memory(Expression::binary(
                BinaryOperator::Plus,
                Expression::Temp(result),
                Expression::Constant(i as i64 * self.word_size()),
            ));

            statements.push(Statement::move_to(destination, value));
        }

        Translated::Value(Expression::sequence(
            Statement::Sequence(statements),
            Expression::Temp(result),
        ))
    }

    pub fn array(&mut self, size: Translated, initializer: Translated) -> Translated {
        let result = self.temps.new_temp();
        let size = self.into_value(size);
        let initializer = self.into_value(initializer);

        let allocation = Statement::move_to(
            Expression::Temp(result),
            frame::external_call(RuntimeFunction::InitArray.label(), vec![size, initializer]),
        );

        Translated::Value(Expression::sequence(allocation, Expression::Temp(result)))
    }

    /// Evaluates every item in order. The sequence has the value of its last
    /// item, if that has one.
    pub fn sequence(&mut self, mut items: Vec<Translated>) -> Translated {
        let Some(last) = items.pop() else {
            return Translated::no_op();
        };

        if items.is_empty() {
            return last;
        }

        let mut statements: Vec<Statement> = items
            .into_iter()
            .map(|item| self.into_effect(item))
            .collect();

        match last {
            Translated::Effect(statement) => {
                statements.push(statement);
                Translated::Effect(Statement::Sequence(statements))
            }
            last => {
                let value = self.into_value(last);
                Translated::Value(Expression::sequence(Statement::Sequence(statements), value))
            }
        }
    }

    pub fn assignment(&mut self, destination: Translated, value: Translated) -> Translated {
        let destination = self.into_value(destination);
        let value = self.into_value(value);

        Translated::Effect(Statement::move_to(destination, value))
    }

    pub fn if_then(&mut self, condition: Translated, positive: Translated) -> Translated {
        let condition = self.into_conditional(condition);
        let positive = self.into_effect(positive);
        let then = self.temps.new_label();
        let done = self.temps.new_label();

        Translated::Effect(Statement::Sequence(vec![
            condition.bind(then, done),
            Statement::Label(then),
            positive,
            Statement::Label(done),
        ]))
    }

    /// When `produces_value` is set both arms write to a shared result temp
    /// which becomes the value of the whole expression
    pub fn if_then_else(
        &mut self,
        condition: Translated,
        positive: Translated,
        negative: Translated,
        produces_value: bool,
    ) -> Translated {
        let condition = self.into_conditional(condition);
        let then = self.temps.new_label();
        let otherwise = self.temps.new_label();
        let done = self.temps.new_label();

        if produces_value {
            let result = self.temps.new_temp();
            let positive = self.into_value(positive);
            let negative = self.into_value(negative);

            let statement = Statement::Sequence(vec![
                condition.bind(then, otherwise),
                Statement::Label(then),
                Statement::move_to(Expression::Temp(result), positive),
                Statement::jump(done),
                Statement::Label(otherwise),
                Statement::move_to(Expression::Temp(result), negative),
                Statement::Label(done),
            ]);

            Translated::Value(Expression::sequence(statement, Expression::Temp(result)))
        } else {
            let positive = self.into_effect(positive);
            let negative = self.into_effect(negative);

            Translated::Effect(Statement::Sequence(vec![
                condition.bind(then, otherwise),
                Statement::Label(then),
                positive,
                Statement::jump(done),
                Statement::Label(otherwise),
                negative,
                Statement::Label(done),
            ]))
        }
    }

    /// `done` must be the label handed out by [`Translator::new_loop_exit`]
    /// before the body was translated
    pub fn while_loop(
        &mut self,
        condition: Translated,
        body: Translated,
        done: Label,
    ) -> Translated {
        let condition = self.into_conditional(condition);
        let body = self.into_effect(body);
        let test = self.temps.new_label();
        let start = self.temps.new_label();

        Translated::Effect(Statement::Sequence(vec![
            Statement::Label(test),
            condition.bind(start, done),
            Statement::Label(start),
            body,
            Statement::jump(test),
            Statement::Label(done),
        ]))
    }

    /// The high bound is evaluated once, before the first iteration. `index`
    /// must have been allocated in the level the loop runs in.
    pub fn for_loop(
        &mut self,
        index: Access,
        low: Translated,
        high: Translated,
        body: Translated,
        done: Label,
    ) -> Translated {
        let index = index.access.to_ir(Expression::Temp(Temp::FRAME_POINTER));
        let limit = Expression::Temp(self.temps.new_temp());
        let low = self.into_value(low);
        let high = self.into_value(high);
        let body = self.into_effect(body);
        let test = self.temps.new_label();
        let start = self.temps.new_label();

        Translated::Effect(Statement::Sequence(vec![
            Statement::move_to(index.clone(), low),
            Statement::move_to(limit.clone(), high),
            Statement::Label(test),
            Statement::ConditionalJump {
                operator: RelationalOperator::Le,
                lhs: index.clone(),
                rhs: limit,
                positive: start,
                negative: done,
            },
            Statement::Label(start),
            body,
            Statement::move_to(
                index.clone(),
                Expression::binary(BinaryOperator::Plus, index, Expression::Constant(1)),
            ),
            Statement::jump(test),
            Statement::Label(done),
        ]))
    }

    pub fn break_loop(&self, done: Label) -> Translated {
        Translated::Effect(Statement::jump(done))
    }

    /// Stores the finished body of the function running at `level`
    pub fn procedure(&mut self, level: LevelId, body: Translated, returns_value: bool) {
        let body = if returns_value {
            let value = self.into_value(body);
            Statement::move_to(Expression::Temp(Temp::RETURN_VALUE), value)
        } else {
            self.into_effect(body)
        };

        self.fragments.push(Fragment::Procedure {
            body,
            frame: self.levels[level].frame.clone(),
        });
    }

    /// Stores the main program as the last fragment and returns every
    /// fragment produced during the compilation
    pub fn finish(mut self, main: Translated, returns_value: bool) -> Vec<Fragment> {
        self.procedure(self.outermost, main, returns_value);
        self.fragments
    }
}
