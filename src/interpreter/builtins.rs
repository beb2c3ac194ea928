//! Builtin call dispatch for the Clot interpreter.
//!
//! Builtins are tried before the user function table. `sum` is only
//! recognized once `import math;` has run.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::error::{check_arity, ErrorKind, RuntimeError};
use super::value::Value;
use super::Interpreter;
use crate::parser::ast::CallExpr;

impl Interpreter {
    /// Dispatch a builtin call. Returns `Ok(None)` when the callee is not a
    /// builtin so the caller can fall back to user functions.
    pub(super) fn call_builtin(
        &mut self,
        call: &CallExpr,
    ) -> Result<Option<Value>, RuntimeError> {
        let value = match call.callee.as_str() {
            "sum" if self.imported_modules.contains("math") => self.builtin_sum(call)?,
            "input" => self.builtin_input(call)?,
            "println" => self.builtin_println(call)?,
            "printf" => self.builtin_printf(call)?,
            "read_file" => self.builtin_read_file(call)?,
            "write_file" => self.builtin_write_file(call, false)?,
            "append_file" => self.builtin_write_file(call, true)?,
            "file_exists" => self.builtin_file_exists(call)?,
            "now_ms" => self.builtin_now_ms(call)?,
            "sleep_ms" => self.builtin_sleep_ms(call)?,
            "async_read_file" => self.builtin_async_read_file(call)?,
            "task_ready" => self.builtin_task_ready(call)?,
            "await" => self.builtin_await(call)?,
            _ => return Ok(None),
        };

        Ok(Some(value))
    }

    fn builtin_sum(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 2, "sum(a, b)")?;

        let left = self.eval_expr(&call.arguments[0].value)?;
        let right = self.eval_expr(&call.arguments[1].value)?;

        let left = read_numeric(&left)?;
        let right = read_numeric(&right)?;
        Ok(Value::Float(left + right))
    }

    fn builtin_input(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        if call.arguments.len() > 1 {
            return Err(RuntimeError::arity("input() accepts 0 or 1 argument"));
        }

        if let Some(argument) = call.arguments.first() {
            let prompt = self.eval_expr(&argument.value)?;
            self.console.print(&prompt.to_display_string());
        }

        let line = self.console.read_line().unwrap_or_default();
        Ok(Value::Str(line))
    }

    fn builtin_println(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        if call.arguments.len() > 1 {
            return Err(RuntimeError::arity("println() accepts 0 or 1 argument"));
        }

        let text = match call.arguments.first() {
            Some(argument) => self.eval_expr(&argument.value)?.to_display_string(),
            None => String::new(),
        };

        self.console.println(&text);
        Ok(Value::Int(0))
    }

    fn builtin_printf(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        if call.arguments.is_empty() {
            return Err(RuntimeError::arity(
                "printf(format, ...args) requires at least 1 argument",
            ));
        }

        let format = self.eval_expr(&call.arguments[0].value)?.to_display_string();

        let mut arguments = Vec::with_capacity(call.arguments.len() - 1);
        for argument in &call.arguments[1..] {
            arguments.push(self.eval_expr(&argument.value)?);
        }

        let rendered = render_printf(&format, &arguments)?;
        self.console.print(&rendered);
        Ok(Value::Int(rendered.len() as i64))
    }

    fn builtin_read_file(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "read_file(path)")?;

        let path = self.eval_expr(&call.arguments[0].value)?.to_display_string();
        let text = std::fs::read_to_string(&path)
            .map_err(|_| RuntimeError::io(format!("could not open file: {}", path)))?;
        Ok(Value::Str(text))
    }

    fn builtin_write_file(&mut self, call: &CallExpr, append: bool) -> Result<Value, RuntimeError> {
        let usage = if append {
            "append_file(path, content)"
        } else {
            "write_file(path, content)"
        };
        check_arity(&call.arguments, 2, usage)?;

        let path = self.eval_expr(&call.arguments[0].value)?.to_display_string();
        let content = self.eval_expr(&call.arguments[1].value)?.to_display_string();

        let result = if append {
            use std::io::Write;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut file| file.write_all(content.as_bytes()))
        } else {
            std::fs::write(&path, content.as_bytes())
        };

        result.map_err(|_| RuntimeError::io(format!("error writing file: {}", path)))?;
        Ok(Value::Bool(true))
    }

    fn builtin_file_exists(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "file_exists(path)")?;

        let path = self.eval_expr(&call.arguments[0].value)?.to_display_string();
        Ok(Value::Bool(Path::new(&path).exists()))
    }

    fn builtin_now_ms(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        if !call.arguments.is_empty() {
            return Err(RuntimeError::arity("now_ms() accepts no arguments"));
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Ok(Value::Int(millis))
    }

    fn builtin_sleep_ms(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "sleep_ms(ms)")?;

        let delay = self.eval_expr(&call.arguments[0].value)?;
        let delay = delay.as_integer().ok_or_else(|| {
            RuntimeError::new(ErrorKind::Type, "sleep_ms(ms) requires an integer delay")
        })?;

        if delay < 0 {
            return Err(RuntimeError::new(
                ErrorKind::Range,
                "sleep_ms(ms) requires a delay >= 0",
            ));
        }

        std::thread::sleep(Duration::from_millis(delay as u64));
        Ok(Value::Int(0))
    }

    fn builtin_async_read_file(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "async_read_file(path)")?;

        let path = self.eval_expr(&call.arguments[0].value)?.to_display_string();
        let task_id = self.tasks.spawn(move || {
            std::fs::read_to_string(&path)
                .map(Value::Str)
                .map_err(|_| RuntimeError::io(format!("could not open file: {}", path)))
        });

        Ok(Value::Int(task_id))
    }

    fn builtin_task_ready(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "task_ready(task_id)")?;

        let task_id = read_task_id(&self.eval_expr(&call.arguments[0].value)?)?;
        match self.tasks.ready(task_id) {
            Some(ready) => Ok(Value::Bool(ready)),
            None => Err(RuntimeError::task_not_found(task_id)),
        }
    }

    fn builtin_await(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        check_arity(&call.arguments, 1, "await(task_id)")?;

        let task_id = read_task_id(&self.eval_expr(&call.arguments[0].value)?)?;
        match self.tasks.take(task_id) {
            Some(outcome) => outcome,
            None => Err(RuntimeError::task_not_found(task_id)),
        }
    }
}

fn read_numeric(value: &Value) -> Result<f64, RuntimeError> {
    value.as_number().ok_or_else(RuntimeError::numeric_required)
}

fn read_task_id(value: &Value) -> Result<i64, RuntimeError> {
    match value.as_integer() {
        Some(task_id) if task_id > 0 => Ok(task_id),
        _ => Err(RuntimeError::invalid_task_id()),
    }
}

/// Render a printf-style format string. Each `%` specifier consumes exactly
/// one argument and the counts must match.
fn render_printf(format: &str, arguments: &[Value]) -> Result<String, RuntimeError> {
    let mut rendered = String::with_capacity(format.len());
    let mut argument_index = 0usize;
    let mut characters = format.chars();

    while let Some(current) = characters.next() {
        if current != '%' {
            rendered.push(current);
            continue;
        }

        let Some(specifier) = characters.next() else {
            return Err(RuntimeError::new(
                ErrorKind::Type,
                "printf: invalid format, '%' without a specifier",
            ));
        };

        if specifier == '%' {
            rendered.push('%');
            continue;
        }

        let Some(argument) = arguments.get(argument_index) else {
            return Err(RuntimeError::arity(
                "printf: not enough arguments for the format",
            ));
        };
        argument_index += 1;

        match specifier {
            'd' | 'i' => {
                let integer = argument.as_integer().ok_or_else(|| {
                    RuntimeError::new(ErrorKind::Type, "printf: %d/%i requires an integer")
                })?;
                rendered.push_str(&integer.to_string());
            }
            'u' => {
                let integer = argument.as_integer().ok_or_else(|| {
                    RuntimeError::new(ErrorKind::Type, "printf: %u requires an integer")
                })?;
                if integer < 0 {
                    return Err(RuntimeError::new(
                        ErrorKind::Range,
                        "printf: %u requires a value >= 0",
                    ));
                }
                rendered.push_str(&integer.to_string());
            }
            'f' => {
                let number = argument.as_number().ok_or_else(|| {
                    RuntimeError::new(ErrorKind::Type, "printf: %f requires a numeric value")
                })?;
                rendered.push_str(&format!("{:.6}", number));
            }
            'c' => {
                let mut emitted = false;

                if let Value::Str(text) = argument {
                    let mut text_chars = text.chars();
                    if let (Some(only), None) = (text_chars.next(), text_chars.next()) {
                        rendered.push(only);
                        emitted = true;
                    }
                }

                if !emitted {
                    match argument.as_integer() {
                        Some(code) if (0..=255).contains(&code) => {
                            rendered.push(code as u8 as char);
                        }
                        _ => {
                            return Err(RuntimeError::new(
                                ErrorKind::Type,
                                "printf: %c requires a one-character string or an integer 0-255",
                            ));
                        }
                    }
                }
            }
            's' => rendered.push_str(&argument.to_display_string()),
            'x' | 'X' => {
                let integer = argument.as_integer().ok_or_else(|| {
                    RuntimeError::new(ErrorKind::Type, "printf: %x/%X requires an integer")
                })?;
                if integer < 0 {
                    return Err(RuntimeError::new(
                        ErrorKind::Range,
                        "printf: %x/%X requires a value >= 0",
                    ));
                }
                if specifier == 'x' {
                    rendered.push_str(&format!("{:x}", integer));
                } else {
                    rendered.push_str(&format!("{:X}", integer));
                }
            }
            other => {
                return Err(RuntimeError::new(
                    ErrorKind::Type,
                    format!("printf: unsupported specifier '%{}'", other),
                ));
            }
        }
    }

    if argument_index != arguments.len() {
        return Err(RuntimeError::arity(
            "printf: too many arguments for the format",
        ));
    }

    Ok(rendered)
}
