use serde::{Deserialize, Serialize};

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ---- Core AST types ----

/// Binary operators over `int`, the only value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Surface syntax for the operator, as the formatter prints it.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal: `42`
    Int(i64),

    /// Variable reference
    Var(String),

    /// Infix binary op: `a + b`, `a < b`
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call used as a value: `f(a, b)`
    Call { name: String, args: Vec<Expr> },
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `int name;` — allocates a fresh local slot
    Declare { name: String },

    /// `name = expr;`
    Assign { name: String, value: Expr },

    /// `if (cond) { ... }` with optional `else { ... }`
    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },

    /// `while (cond) { ... }`
    While { condition: Expr, body: Vec<Stmt> },

    /// `f(a, b);` — call for effect
    Call { name: String, args: Vec<Expr> },

    /// `return expr;`
    Return(Expr),
}

/// A function definition, the top-level compilation unit.
/// Parameters are plain names; the only type is `int`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    #[serde(skip)]
    pub span: Span,
}

/// A complete program is a list of function definitions in source order.
/// Order matters for code generation: calls resolve only to functions
/// already compiled (or the function currently compiling itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
    #[serde(skip)]
    pub source: Option<String>,
}
