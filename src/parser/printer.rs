//! Source printer for the AST
//!
//! `Display` implementations that turn an AST back into source text which
//! parses to an equal tree. Binary expressions are always parenthesised, so
//! the output never depends on precedence. Literals have no sign syntax, so a
//! negative [`Expression::Number`] is printed as `(0 - n)` and will not
//! round-trip to the same node.

use crate::parser::ast::*;
use std::fmt;

const INDENT: &str = "    ";

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) if *n < 0 => write!(f, "(0 - {})", n.unsigned_abs()),
            Expression::Number(n) => write!(f, "{}", n),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Expression::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expression::Call { name, arguments } => {
                write!(f, "{}(", name)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for statement in &block.statements {
        write_statement(f, statement, depth + 1)?;
    }
    write!(f, "{}}}", INDENT.repeat(depth))
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement, depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    match statement {
        Statement::Expression(expr) => writeln!(f, "{}{};", pad, expr),
        Statement::Set { target, value } => writeln!(f, "{}{} = {};", pad, target, value),
        Statement::Return(None) => writeln!(f, "{}return;", pad),
        Statement::Return(Some(expr)) => writeln!(f, "{}return {};", pad, expr),
        Statement::If {
            condition,
            then_block,
            else_block,
        } => {
            write!(f, "{}if ({}) ", pad, condition)?;
            write_block(f, then_block, depth)?;
            if let Some(else_block) = else_block {
                write!(f, " else ")?;
                write_block(f, else_block, depth)?;
            }
            writeln!(f)
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self, 0)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl fmt::Display for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}({}) {{",
            self.kind().keyword(),
            self.name,
            self.parameters.join(", ")
        )?;
        if !self.locals.is_empty() {
            writeln!(f, "{}var {};", INDENT, self.locals.join(", "))?;
        }
        for statement in &self.body.statements {
            write_statement(f, statement, 1)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}
