//! Tree-walking interpreter for Clot programs
//!
//! Executes the AST directly against a flat environment. Function calls
//! swap in a fresh environment seeded from the caller's, record by-reference
//! bindings on entry and write them back on exit. `return` is a control
//! signal carried on a return stack, not an error, so it stays orthogonal
//! to `try/catch`.

mod builtins;
pub mod console;
mod environment;
mod error;
mod modules;
mod tasks;
mod value;

pub use console::{ConsoleCapability, MockConsole, RealConsole};
pub use environment::Environment;
pub use error::{ErrorKind, RuntimeError};
pub use tasks::TaskRegistry;
pub use value::{format_number, Value, VariableKind, VariableSlot};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::parser::ast::*;

/// One resolved step of a mutation target: a property hop or a list index.
enum TargetStep {
    Property(String),
    Index(usize),
}

/// Interpreter for Clot programs
pub struct Interpreter {
    env: Environment,
    functions: HashMap<String, Rc<FunctionDecl>>,
    /// One optional slot per active call frame; `Some` means a return is
    /// pending on that frame.
    return_stack: Vec<Option<Value>>,
    /// Module ids whose top-level has executed (plus the `math` sentinel)
    imported_modules: HashSet<String>,
    /// Module ids currently executing; membership here on re-entry is a cycle
    importing_modules: HashSet<String>,
    module_base_dirs: Vec<PathBuf>,
    entry_file: Option<PathBuf>,
    tasks: TaskRegistry,
    console: Box<dyn ConsoleCapability>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_console(Box::new(RealConsole))
    }

    /// Create an interpreter with a specific console capability
    pub fn with_console(console: Box<dyn ConsoleCapability>) -> Self {
        Self {
            env: Environment::new(),
            functions: HashMap::new(),
            return_stack: Vec::new(),
            imported_modules: HashSet::new(),
            importing_modules: HashSet::new(),
            module_base_dirs: Vec::new(),
            entry_file: None,
            tasks: TaskRegistry::new(),
            console,
        }
    }

    /// Record the entry file; its parent directory seeds module resolution.
    pub fn set_entry_file(&mut self, path: &Path) {
        self.entry_file = Some(path.to_path_buf());
    }

    /// Execute a program from a clean slate.
    pub fn execute(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.env = Environment::new();
        self.functions.clear();
        self.return_stack.clear();
        self.imported_modules.clear();
        self.importing_modules.clear();
        self.module_base_dirs.clear();
        self.tasks = TaskRegistry::new();

        if let Some(parent) = self.entry_file.as_ref().and_then(|file| file.parent()) {
            self.module_base_dirs.push(parent.to_path_buf());
        }

        for statement in &program.statements {
            self.execute_statement(statement)?;
        }

        if !self.return_stack.is_empty() {
            return Err(RuntimeError::internal("return stack left inconsistent"));
        }

        Ok(())
    }

    /// Run a statement sequence, stopping early once a return is pending on
    /// the current frame.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute_statement(statement)?;

            if self.return_pending() {
                break;
            }
        }

        Ok(())
    }

    fn return_pending(&self) -> bool {
        matches!(self.return_stack.last(), Some(Some(_)))
    }

    fn execute_statement(&mut self, statement: &Stmt) -> Result<(), RuntimeError> {
        match statement {
            Stmt::Assignment {
                name,
                op,
                declaration,
                expr,
            } => {
                let value = self.eval_expr(expr)?;
                self.assign(name, *op, *declaration, value)
            }
            Stmt::Mutation { target, op, expr } => {
                let value = self.eval_expr(expr)?;

                if let Expr::Variable(name) = target {
                    if !name.contains('.') {
                        return self.apply_variable_mutation(name, *op, value);
                    }
                }

                self.apply_target_mutation(target, *op, value)
            }
            Stmt::Print { expr, newline } => {
                let value = self.eval_expr(expr)?;
                let text = value.to_display_string();
                if *newline {
                    self.console.println(&text);
                } else {
                    self.console.print(&text);
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(condition)?.truthy() {
                    self.execute_block(then_branch)
                } else {
                    self.execute_block(else_branch)
                }
            }
            Stmt::While { condition, body } => {
                while self.eval_expr(condition)?.truthy() {
                    self.execute_block(body)?;

                    if self.return_pending() {
                        break;
                    }
                }
                Ok(())
            }
            Stmt::FunctionDecl(declaration) => {
                self.functions
                    .insert(declaration.name.clone(), Rc::clone(declaration));
                Ok(())
            }
            Stmt::Import { module } => self.import_module(module),
            Stmt::TryCatch {
                try_branch,
                error_binding,
                catch_branch,
            } => self.execute_try_catch(try_branch, error_binding.as_deref(), catch_branch),
            Stmt::Return { expr } => {
                if self.return_stack.is_empty() {
                    return Err(RuntimeError::return_outside_function());
                }

                let value = match expr {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Int(0),
                };

                if let Some(slot) = self.return_stack.last_mut() {
                    *slot = Some(value);
                }
                Ok(())
            }
            Stmt::Expression(expr) => {
                if let Expr::Call(call) = expr {
                    self.execute_call(call, false)?;
                } else {
                    self.eval_expr(expr)?;
                }
                Ok(())
            }
        }
    }

    /// Assignment by name. Dotted names route through the mutation path;
    /// `long`/`byte` statements upgrade the slot's declaration kind.
    fn assign(
        &mut self,
        name: &str,
        op: AssignOp,
        declaration: DeclarationType,
        value: Value,
    ) -> Result<(), RuntimeError> {
        if name.contains('.') {
            if declaration != DeclarationType::Inferred {
                return Err(RuntimeError::new(
                    ErrorKind::Type,
                    "cannot declare a long/byte slot on an object property",
                ));
            }

            let target = Expr::Variable(name.to_string());
            return self.apply_target_mutation(&target, op, value);
        }

        if op != AssignOp::Set {
            return self.apply_variable_mutation(name, op, value);
        }

        let mut kind = self
            .env
            .get(name)
            .map(|slot| slot.kind)
            .unwrap_or(VariableKind::Dynamic);

        match declaration {
            DeclarationType::Long => kind = VariableKind::Long,
            DeclarationType::Byte => kind = VariableKind::Byte,
            DeclarationType::Inferred => {}
        }

        let normalized = normalize_for_kind(kind, value)?;
        self.env.define(name, VariableSlot { value: normalized, kind });
        Ok(())
    }

    /// `+=`/`-=` (and plain `=`) on an undotted variable, honoring the
    /// slot's declaration kind.
    fn apply_variable_mutation(
        &mut self,
        name: &str,
        op: AssignOp,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let current = self.env.get(name).map(|slot| (slot.kind, slot.value.clone()));

        let Some((kind, existing)) = current else {
            if op != AssignOp::Set {
                return Err(RuntimeError::undefined_variable(name));
            }
            self.env.define(name, VariableSlot::dynamic(value));
            return Ok(());
        };

        let value_to_store = match op {
            AssignOp::Set => value,
            AssignOp::AddAssign => evaluate_binary(BinaryOp::Add, &existing, &value)?,
            AssignOp::SubAssign => evaluate_binary(BinaryOp::Subtract, &existing, &value)?,
        };

        let normalized = normalize_for_kind(kind, value_to_store)?;
        if let Some(slot) = self.env.get_mut(name) {
            slot.value = normalized;
        }
        Ok(())
    }

    /// Mutation through an index or property-chain target. Only the final
    /// property of a chain may be created, and only by plain `=`.
    fn apply_target_mutation(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let (root, steps) = self.resolve_target_path(target)?;
        let location = self.navigate_target_mut(&root, &steps, op == AssignOp::Set)?;

        let value_to_store = match op {
            AssignOp::Set => value,
            AssignOp::AddAssign => evaluate_binary(BinaryOp::Add, location, &value)?,
            AssignOp::SubAssign => evaluate_binary(BinaryOp::Subtract, location, &value)?,
        };

        *location = value_to_store;
        Ok(())
    }

    /// Flatten a mutation target into its root variable and the steps into
    /// nested aggregates, evaluating index expressions as they appear.
    fn resolve_target_path(
        &mut self,
        target: &Expr,
    ) -> Result<(String, Vec<TargetStep>), RuntimeError> {
        match target {
            Expr::Variable(name) => match name.split_once('.') {
                None => Ok((name.clone(), Vec::new())),
                Some((root, rest)) => {
                    let mut steps = Vec::new();
                    for segment in rest.split('.') {
                        if segment.is_empty() {
                            return Err(RuntimeError::invalid_property_access(name));
                        }
                        steps.push(TargetStep::Property(segment.to_string()));
                    }
                    Ok((root.to_string(), steps))
                }
            },
            Expr::Index { collection, index } => {
                let (root, mut steps) = self.resolve_target_path(collection)?;
                let index_value = self.eval_expr(index)?;
                steps.push(TargetStep::Index(read_list_index(&index_value)?));
                Ok((root, steps))
            }
            _ => Err(RuntimeError::new(
                ErrorKind::Type,
                "left side of a mutation must be a variable or index expression",
            )),
        }
    }

    /// Walk a resolved target path to its mutable location. Interior steps
    /// must already exist; `create_missing_property` applies to a trailing
    /// property step only.
    fn navigate_target_mut(
        &mut self,
        root: &str,
        steps: &[TargetStep],
        create_missing_property: bool,
    ) -> Result<&mut Value, RuntimeError> {
        let slot = self
            .env
            .get_mut(root)
            .ok_or_else(|| RuntimeError::undefined_variable(root))?;

        let mut current = &mut slot.value;
        let last = steps.len().saturating_sub(1);

        for (position, step) in steps.iter().enumerate() {
            let owned = current;
            current = match step {
                TargetStep::Property(key) => {
                    if !owned.is_object() {
                        return Err(RuntimeError::property_on_non_object(key));
                    }

                    if create_missing_property && position == last {
                        owned
                            .ensure_property(key)
                            .ok_or_else(|| RuntimeError::internal("object entry unreachable"))?
                    } else {
                        owned
                            .property_mut(key)
                            .ok_or_else(|| RuntimeError::missing_property(key))?
                    }
                }
                TargetStep::Index(index) => {
                    let Value::List(items) = owned else {
                        return Err(RuntimeError::mutate_non_list());
                    };

                    if *index >= items.len() {
                        return Err(RuntimeError::index_out_of_bounds());
                    }

                    &mut items[*index]
                }
            };
        }

        Ok(current)
    }

    /// Resolve a (possibly dotted) variable reference to a copy of its value.
    fn resolve_variable(&self, name: &str) -> Result<Value, RuntimeError> {
        let Some((root, rest)) = name.split_once('.') else {
            return self
                .env
                .get(name)
                .map(|slot| slot.value.clone())
                .ok_or_else(|| RuntimeError::undefined_variable(name));
        };

        let slot = self
            .env
            .get(root)
            .ok_or_else(|| RuntimeError::undefined_variable(root))?;

        let mut current = &slot.value;
        for segment in rest.split('.') {
            if segment.is_empty() {
                return Err(RuntimeError::invalid_property_access(name));
            }

            current = current
                .property(segment)
                .ok_or_else(|| RuntimeError::missing_property(segment))?;
        }

        Ok(current.clone())
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number { value, exact } => Ok(match exact {
                Some(integer) => Value::Int(*integer),
                None => Value::Float(*value),
            }),
            Expr::Str(text) => Ok(Value::Str(text.clone())),
            Expr::Bool(flag) => Ok(Value::Bool(*flag)),
            Expr::Variable(name) => self.resolve_variable(name),
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element)?);
                }
                Ok(Value::List(values))
            }
            Expr::Object(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for entry in entries {
                    let value = self.eval_expr(&entry.value)?;
                    values.push((entry.key.clone(), value));
                }
                Ok(Value::Object(values))
            }
            Expr::Index { collection, index } => {
                let collection = self.eval_expr(collection)?;
                let index_value = self.eval_expr(index)?;

                let Value::List(items) = &collection else {
                    return Err(RuntimeError::index_non_list());
                };

                let index = read_list_index(&index_value)?;
                if index >= items.len() {
                    return Err(RuntimeError::index_out_of_bounds());
                }

                Ok(items[index].clone())
            }
            Expr::Call(call) => self.execute_call(call, true),
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                evaluate_unary(*op, &operand)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                evaluate_binary(*op, &lhs, &rhs)
            }
        }
    }

    /// Dispatch a call: builtins first, then the user function table.
    /// `require_return_value` distinguishes expression-position calls from
    /// bare call statements, which tolerate a missing return.
    pub(crate) fn execute_call(
        &mut self,
        call: &CallExpr,
        require_return_value: bool,
    ) -> Result<Value, RuntimeError> {
        if let Some(value) = self.call_builtin(call)? {
            return Ok(value);
        }

        let Some(function) = self.functions.get(&call.callee).map(Rc::clone) else {
            return Err(RuntimeError::undefined_function(&call.callee));
        };

        self.call_user_function(&function, call, require_return_value)
    }

    fn call_user_function(
        &mut self,
        function: &FunctionDecl,
        call: &CallExpr,
        require_return_value: bool,
    ) -> Result<Value, RuntimeError> {
        if call.arguments.len() != function.params.len() {
            return Err(RuntimeError::wrong_argument_count(&function.name));
        }

        // (parameter name, caller variable) pairs written back on exit
        let mut reference_bindings: Vec<(String, String)> = Vec::new();
        let mut local_env = self.env.clone();

        for (param, argument) in function.params.iter().zip(&call.arguments) {
            if param.by_reference {
                let Expr::Variable(caller_name) = &argument.value else {
                    return Err(RuntimeError::reference_requires_variable(&param.name));
                };

                if caller_name.contains('.') {
                    return Err(RuntimeError::reference_no_property_access(caller_name));
                }

                let Some(slot) = self.env.get(caller_name) else {
                    return Err(RuntimeError::reference_undefined_variable(caller_name));
                };

                local_env.define(param.name.clone(), slot.clone());
                reference_bindings.push((param.name.clone(), caller_name.clone()));
                continue;
            }

            if argument.by_reference {
                return Err(RuntimeError::reference_to_by_value(&param.name));
            }

            let value = self.eval_expr(&argument.value)?;
            local_env.define(param.name.clone(), VariableSlot::dynamic(value));
        }

        let mut caller_env = std::mem::replace(&mut self.env, local_env);
        self.return_stack.push(None);

        let body_result = self.execute_block(&function.body);
        let returned = self.return_stack.pop().flatten();

        if let Err(error) = body_result {
            self.env = caller_env;
            return Err(error);
        }

        for (param_name, caller_name) in &reference_bindings {
            if let Some(slot) = self.env.get(param_name) {
                caller_env.define(caller_name.clone(), slot.clone());
            }
        }

        self.env = caller_env;

        if require_return_value {
            return returned.ok_or_else(|| RuntimeError::did_not_return(&function.name));
        }

        Ok(returned.unwrap_or(Value::Int(0)))
    }

    /// Run the try block; an in-flight return defeats the catch. Otherwise
    /// bind the canonical error message for the catch block's duration.
    fn execute_try_catch(
        &mut self,
        try_branch: &[Stmt],
        error_binding: Option<&str>,
        catch_branch: &[Stmt],
    ) -> Result<(), RuntimeError> {
        let try_error = match self.execute_block(try_branch) {
            Ok(()) => return Ok(()),
            Err(error) => error,
        };

        if self.return_pending() {
            return Err(try_error);
        }

        let mut previous_slot = None;
        if let Some(binding) = error_binding {
            previous_slot = self.env.remove(binding);
            self.env.define(
                binding,
                VariableSlot::dynamic(Value::Str(try_error.to_string())),
            );
        }

        let catch_result = self.execute_block(catch_branch);

        if let Some(binding) = error_binding {
            match previous_slot {
                Some(slot) => self.env.define(binding, slot),
                None => {
                    self.env.remove(binding);
                }
            }
        }

        catch_result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerce a value for storage in a slot of the given declaration kind.
/// `long` and `byte` slots hold integers; anything that does not read as a
/// number is a type error, anything outside the kind's range a range error.
fn normalize_for_kind(kind: VariableKind, value: Value) -> Result<Value, RuntimeError> {
    match kind {
        VariableKind::Dynamic => Ok(value),
        VariableKind::Long => {
            let numeric = value.as_number().ok_or_else(RuntimeError::numeric_required)?;
            const UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;
            if !numeric.is_finite() || numeric < i64::MIN as f64 || numeric >= UPPER_EXCLUSIVE {
                return Err(RuntimeError::long_out_of_range());
            }
            Ok(Value::Int(numeric.trunc() as i64))
        }
        VariableKind::Byte => {
            let numeric = value.as_number().ok_or_else(RuntimeError::numeric_required)?;
            if !(0.0..=255.0).contains(&numeric) {
                return Err(RuntimeError::byte_out_of_range());
            }
            Ok(Value::Int(numeric.trunc() as i64))
        }
    }
}

/// Read a list index: numeric, finite, integral, non-negative.
fn read_list_index(value: &Value) -> Result<usize, RuntimeError> {
    let numeric = value.as_number().ok_or_else(RuntimeError::numeric_required)?;

    if !numeric.is_finite() || numeric.trunc() != numeric {
        return Err(RuntimeError::invalid_index());
    }

    const UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;
    if numeric < 0.0 || numeric >= UPPER_EXCLUSIVE {
        return Err(RuntimeError::index_out_of_bounds());
    }

    Ok(numeric as usize)
}

fn read_numeric(value: &Value) -> Result<f64, RuntimeError> {
    value.as_number().ok_or_else(RuntimeError::numeric_required)
}

/// Unary operator semantics. `+`/`-` stay integral when the operand reads
/// as an integer; negating `i64::MIN` promotes to float.
pub(crate) fn evaluate_unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    if op == UnaryOp::LogicalNot {
        return Ok(Value::Bool(!operand.truthy()));
    }

    if let Some(integer) = operand.as_integer() {
        return Ok(match op {
            UnaryOp::Negate => {
                if integer == i64::MIN {
                    Value::Float(-(integer as f64))
                } else {
                    Value::Int(-integer)
                }
            }
            _ => Value::Int(integer),
        });
    }

    let numeric = read_numeric(operand)?;
    Ok(match op {
        UnaryOp::Negate => Value::Float(-numeric),
        _ => Value::Float(numeric),
    })
}

/// Binary operator semantics.
///
/// `+` with a string operand concatenates canonical string forms. `+`/`-`
/// use integer arithmetic when both operands read as integers, with
/// overflow falling back to float; `* / % ^` and the orderings always use
/// float arithmetic. Equality compares aggregates and strings by canonical
/// form, booleans by truthiness, and numbers numerically.
pub(crate) fn evaluate_binary(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Add && (lhs.is_string() || rhs.is_string()) {
        let mut text = lhs.to_display_string();
        text.push_str(&rhs.to_display_string());
        return Ok(Value::Str(text));
    }

    if op == BinaryOp::LogicalAnd {
        return Ok(Value::Bool(lhs.truthy() && rhs.truthy()));
    }

    if op == BinaryOp::LogicalOr {
        return Ok(Value::Bool(lhs.truthy() || rhs.truthy()));
    }

    let left_integer = lhs.as_integer();
    let right_integer = rhs.as_integer();

    if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) {
        let equal = if lhs.is_aggregate() || rhs.is_aggregate() || lhs.is_string() || rhs.is_string()
        {
            lhs.to_display_string() == rhs.to_display_string()
        } else if matches!(lhs, Value::Bool(_)) || matches!(rhs, Value::Bool(_)) {
            lhs.truthy() == rhs.truthy()
        } else if let (Some(left), Some(right)) = (left_integer, right_integer) {
            left == right
        } else {
            read_numeric(lhs)? == read_numeric(rhs)?
        };

        return Ok(Value::Bool(if op == BinaryOp::Equal { equal } else { !equal }));
    }

    // Only + and - stay integral; * / % ^ and the orderings go through float.
    if let (Some(left), Some(right)) = (left_integer, right_integer) {
        match op {
            BinaryOp::Add => {
                return Ok(match left.checked_add(right) {
                    Some(sum) => Value::Int(sum),
                    None => Value::Float(left as f64 + right as f64),
                });
            }
            BinaryOp::Subtract => {
                return Ok(match left.checked_sub(right) {
                    Some(difference) => Value::Int(difference),
                    None => Value::Float(left as f64 - right as f64),
                });
            }
            _ => {}
        }
    }

    let left = read_numeric(lhs)?;
    let right = read_numeric(rhs)?;

    match op {
        BinaryOp::Add => Ok(Value::Float(left + right)),
        BinaryOp::Subtract => Ok(Value::Float(left - right)),
        BinaryOp::Multiply => Ok(Value::Float(left * right)),
        BinaryOp::Divide => Ok(Value::Float(left / right)),
        BinaryOp::Modulo => Ok(Value::Float(left % right)),
        BinaryOp::Power => Ok(Value::Float(left.powf(right))),
        BinaryOp::Less => Ok(Value::Bool(left < right)),
        BinaryOp::LessEqual => Ok(Value::Bool(left <= right)),
        BinaryOp::Greater => Ok(Value::Bool(left > right)),
        BinaryOp::GreaterEqual => Ok(Value::Bool(left >= right)),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr => Err(RuntimeError::internal("unsupported binary operation")),
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
