use core::fmt::{self, Write};

use colored::Colorize;
use itertools::Itertools;

use crate::{
    index::Index,
    middle::{
        frame::Fragment,
        ir::{Expression, Statement},
        temp::Temp,
    },
};

const INDENT: &str = "    ";

pub fn format_fragments(fragments: &[Fragment]) -> String {
    let mut output = String::new();

    for fragment in fragments {
        match fragment {
            Fragment::StringLiteral { label, text } => {
                let _ = writeln!(
                    output,
                    "{} {}{} {:?}",
                    "string".magenta(),
                    label.to_string().blue(),
                    ":".white(),
                    text
                );
            }
            Fragment::Procedure { body, frame } => {
                let _ = writeln!(
                    output,
                    "{} {}{}{}{}",
                    "procedure".magenta(),
                    frame.label.to_string().blue(),
                    "(".white(),
                    frame
                        .formals
                        .iter()
                        .map(|formal| formal.to_string())
                        .join(", ")
                        .white(),
                    ")".white()
                );
                let _ = write!(output, "{body}");
            }
        }
    }

    output
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }

    Ok(())
}

fn close(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    writeln!(f, "{}", ")".white())
}

fn write_statement(f: &mut fmt::Formatter<'_>, depth: usize, statement: &Statement) -> fmt::Result {
    indent(f, depth)?;

    match statement {
        Statement::Sequence(statements) => {
            writeln!(f, "{}", "SEQ(".cyan())?;

            for statement in statements {
                write_statement(f, depth + 1, statement)?;
            }

            close(f, depth)
        }
        Statement::Label(label) => {
            writeln!(f, "{} {}", "LABEL".cyan(), label.to_string().blue())
        }
        Statement::Jump { target, .. } => {
            writeln!(f, "{}", "JUMP(".cyan())?;
            write_expression(f, depth + 1, target)?;
            close(f, depth)
        }
        Statement::ConditionalJump {
            operator,
            lhs,
            rhs,
            positive,
            negative,
        } => {
            writeln!(f, "{}{}", "CJUMP(".cyan(), operator.to_string().white())?;
            write_expression(f, depth + 1, lhs)?;
            write_expression(f, depth + 1, rhs)?;
            indent(f, depth + 1)?;
            writeln!(
                f,
                "{}, {}{}",
                positive.to_string().blue(),
                negative.to_string().blue(),
                ")".white()
            )
        }
        Statement::Move {
            destination,
            source,
        } => {
            writeln!(f, "{}", "MOVE(".cyan())?;
            write_expression(f, depth + 1, destination)?;
            write_expression(f, depth + 1, source)?;
            close(f, depth)
        }
        Statement::Expression(expression) => {
            writeln!(f, "{}", "EXPR(".cyan())?;
            write_expression(f, depth + 1, expression)?;
            close(f, depth)
        }
    }
}

fn write_expression(
    f: &mut fmt::Formatter<'_>,
    depth: usize,
    expression: &Expression,
) -> fmt::Result {
    indent(f, depth)?;

    match expression {
        Expression::Binary { operator, lhs, rhs } => {
            writeln!(f, "{}{}", "BINOP(".cyan(), operator.to_string().white())?;
            write_expression(f, depth + 1, lhs)?;
            write_expression(f, depth + 1, rhs)?;
            close(f, depth)
        }
        Expression::Memory(address) => {
            writeln!(f, "{}", "MEM(".cyan())?;
            write_expression(f, depth + 1, address)?;
            close(f, depth)
        }
        Expression::Temp(temp) => writeln!(f, "{} {temp}", "TEMP".cyan()),
        Expression::Sequence(statement, expression) => {
            writeln!(f, "{}", "ESEQ(".cyan())?;
            write_statement(f, depth + 1, statement)?;
            write_expression(f, depth + 1, expression)?;
            close(f, depth)
        }
        Expression::Name(label) => {
            writeln!(f, "{} {}", "NAME".cyan(), label.to_string().blue())
        }
        Expression::Constant(value) => {
            writeln!(f, "{} {}", "CONST".cyan(), value.to_string().purple())
        }
        Expression::Call {
            function,
            arguments,
        } => {
            writeln!(f, "{}", "CALL(".cyan())?;
            write_expression(f, depth + 1, function)?;

            for argument in arguments {
                write_expression(f, depth + 1, argument)?;
            }

            close(f, depth)
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, 0, self)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expression(f, 0, self)
    }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Temp::FRAME_POINTER => write!(f, "{}", "fp".red()),
            Temp::RETURN_VALUE => write!(f, "{}", "rv".red()),
            temp => write!(f, "{}", format!("t{}", temp.index()).red()),
        }
    }
}
