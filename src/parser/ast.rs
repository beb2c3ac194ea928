//! Abstract syntax tree for Clot programs
//!
//! Expressions and statements are closed sums with exhaustive case analysis
//! in the interpreter. Function declarations are reference-counted so the
//! interpreter's function table can share them with the owning program.

use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    AddAssign,
    SubAssign,
}

/// Declaration kind requested by an assignment statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationType {
    Inferred,
    Long,
    Byte,
}

/// One `key: value` entry of an object literal; keys come from identifier or
/// string tokens and preserve source order.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: String,
    pub value: Expr,
}

/// A call argument, optionally marked by-reference with `&`
#[derive(Debug, Clone)]
pub struct CallArgument {
    pub by_reference: bool,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: String,
    pub arguments: Vec<CallArgument>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Numeric literal. `exact` carries the integer value when the source
    /// lexeme had no dot and fits a 64-bit signed integer.
    Number { value: f64, exact: Option<i64> },
    /// String literal, already unescaped
    Str(String),
    Bool(bool),
    /// Variable reference; the name may contain dots (`user.age`)
    Variable(String),
    List(Vec<Expr>),
    Object(Vec<ObjectEntry>),
    Index {
        collection: Box<Expr>,
        index: Box<Expr>,
    },
    Call(CallExpr),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// A declared function parameter
#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub by_reference: bool,
}

/// A user function declaration, shared between the AST and the interpreter's
/// function table.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Assignment {
        name: String,
        op: AssignOp,
        declaration: DeclarationType,
        expr: Expr,
    },
    /// Assignment whose left side is an index or property-chain expression
    Mutation {
        target: Expr,
        op: AssignOp,
        expr: Expr,
    },
    Print {
        expr: Expr,
        newline: bool,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    FunctionDecl(Rc<FunctionDecl>),
    Import {
        module: String,
    },
    TryCatch {
        try_branch: Vec<Stmt>,
        error_binding: Option<String>,
        catch_branch: Vec<Stmt>,
    },
    Return {
        expr: Option<Expr>,
    },
    Expression(Expr),
}

/// An ordered sequence of top-level statements
#[derive(Debug, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
