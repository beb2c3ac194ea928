//! Clot Programming Language
//!
//! Clot is a small imperative scripting language with dynamic values,
//! user-defined functions, lexical modules and cooperative async tasks.
//! This crate contains the line-oriented frontend and the tree-walking
//! interpreter.

pub mod cli;
pub mod diagnostics;
pub mod interpreter;
pub mod parser;
pub mod runtime;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diagnostics::Diagnostic;
    pub use crate::interpreter::{Interpreter, RuntimeError, Value};
    pub use crate::parser::ast::*;
}
