// AST (Abstract Syntax Tree) definitions for the stack language

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary operators, in the order of the precedence table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Logical
    Or,
    And,
    // Relational
    Less,
    Greater,
    Equal,
    NotEqual,
    // Additive
    Add,
    Sub,
    // Multiplicative
    Mul,
    Div,
}

impl BinaryOp {
    /// Binding level, loosest (0) to tightest (4)
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 0,
            BinaryOp::And => 1,
            BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::Equal
            | BinaryOp::NotEqual => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
        }
    }

    /// Source spelling of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// `&&` and `||` evaluate their right operand conditionally
    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Identity, // +x
    Negate,   // -x
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Identity => "+",
            UnaryOp::Negate => "-",
        }
    }
}

/// Expressions. Every expression evaluates to a 64-bit integer, except
/// calls to void functions which produce nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Number(i64),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        name: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn number(value: i64) -> Self {
        Expression::Number(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            arguments,
        }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Evaluated for its side effects; any value is discarded
    Expression(Expression),
    Set {
        target: String,
        value: Expression,
    },
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
    },
}

/// Braced sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }
}

/// Whether a function hands a value back to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Declared with `proc`
    Void,
    /// Declared with `func`
    Value,
}

impl FunctionKind {
    pub fn produces_value(self) -> bool {
        matches!(self, FunctionKind::Value)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            FunctionKind::Void => "proc",
            FunctionKind::Value => "func",
        }
    }
}

/// Function declaration (`func` or `proc`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub parameters: Vec<String>,
    pub locals: Vec<String>,
    pub body: Block,
    pub produces_value: bool,
}

impl FunctionDeclaration {
    pub fn kind(&self) -> FunctionKind {
        if self.produces_value {
            FunctionKind::Value
        } else {
            FunctionKind::Void
        }
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == name)
    }

    pub fn local_index(&self, name: &str) -> Option<usize> {
        self.locals.iter().position(|l| l == name)
    }
}

/// Top-level program structure: function declarations in source order.
///
/// Name uniqueness is not enforced here; the verifier reports duplicates
/// as `FunctionRedefinition` so the AST always reflects what was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<FunctionDeclaration>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
