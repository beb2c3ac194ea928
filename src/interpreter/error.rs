//! Runtime error types for the Clot interpreter.

use std::fmt;

/// Canonical, language-neutral error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown character or unterminated string literal
    Lex,
    /// Unexpected token, missing punctuation or terminator
    Parse,
    /// Undefined variable, undefined function, missing property
    Name,
    /// Numeric coercion failure, indexing or mutating the wrong shape
    Type,
    /// Index out of bounds, value out of range for a typed slot
    Range,
    /// Argument count mismatch
    Arity,
    /// By-reference parameter bound to a non-variable or missing variable
    Reference,
    /// `return` outside a function
    ReturnContext,
    /// Module not found, module parse failure, circular import
    Module,
    /// File or stream operation failed
    Io,
    /// Broken invariant; should be unreachable
    Internal,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Lex => "LexError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Name => "NameError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Arity => "ArityError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::ReturnContext => "ReturnContextError",
            ErrorKind::Module => "ModuleError",
            ErrorKind::Io => "IOError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

/// Runtime error with its canonical kind and message
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("undefined variable: {}", name))
    }

    pub fn undefined_function(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("undefined function: {}", name))
    }

    pub fn missing_property(key: &str) -> Self {
        Self::new(ErrorKind::Name, format!("property not found: {}", key))
    }

    pub fn invalid_property_access(name: &str) -> Self {
        Self::new(
            ErrorKind::Name,
            format!("invalid property access: {}", name),
        )
    }

    pub fn property_on_non_object(key: &str) -> Self {
        Self::new(
            ErrorKind::Type,
            format!("cannot access property on a non-object value: {}", key),
        )
    }

    pub fn numeric_required() -> Self {
        Self::new(ErrorKind::Type, "expression requires a numeric value")
    }

    pub fn index_non_list() -> Self {
        Self::new(ErrorKind::Type, "only lists can be indexed with []")
    }

    pub fn mutate_non_list() -> Self {
        Self::new(ErrorKind::Type, "only lists can be mutated with []")
    }

    pub fn invalid_index() -> Self {
        Self::new(ErrorKind::Type, "list index must be a finite integer")
    }

    pub fn index_out_of_bounds() -> Self {
        Self::new(ErrorKind::Range, "list index out of bounds")
    }

    pub fn long_out_of_range() -> Self {
        Self::new(ErrorKind::Range, "value out of range for long")
    }

    pub fn byte_out_of_range() -> Self {
        Self::new(ErrorKind::Range, "value out of range for byte (0-255)")
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    pub fn wrong_argument_count(function: &str) -> Self {
        Self::new(
            ErrorKind::Arity,
            format!("wrong number of arguments for function '{}'", function),
        )
    }

    pub fn reference_requires_variable(param: &str) -> Self {
        Self::new(
            ErrorKind::Reference,
            format!("by-reference parameter '{}' requires a variable", param),
        )
    }

    pub fn reference_no_property_access(name: &str) -> Self {
        Self::new(
            ErrorKind::Reference,
            format!("by-reference arguments do not support property access: {}", name),
        )
    }

    pub fn reference_undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::Reference,
            format!("undefined variable for by-reference argument: {}", name),
        )
    }

    pub fn reference_to_by_value(param: &str) -> Self {
        Self::new(
            ErrorKind::Reference,
            format!("cannot pass '&' to a by-value parameter: {}", param),
        )
    }

    pub fn return_outside_function() -> Self {
        Self::new(
            ErrorKind::ReturnContext,
            "return is only allowed inside a function",
        )
    }

    pub fn did_not_return(function: &str) -> Self {
        Self::new(
            ErrorKind::Type,
            format!("function '{}' did not return a value", function),
        )
    }

    pub fn circular_import(module_id: &str) -> Self {
        Self::new(
            ErrorKind::Module,
            format!("circular import detected in module: {}", module_id),
        )
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(ErrorKind::Name, format!("task id not found: {}", task_id))
    }

    pub fn invalid_task_id() -> Self {
        Self::new(ErrorKind::Type, "task id must be a positive integer")
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Check that a builtin received exactly `expected` arguments.
pub fn check_arity<T>(args: &[T], expected: usize, usage: &str) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::arity(format!(
            "{} requires {} argument{}",
            usage,
            expected,
            if expected == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}
