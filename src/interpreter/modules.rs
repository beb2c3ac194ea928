//! Module loading and resolution for the Clot interpreter.
//!
//! Module names resolve relative to the importing module's directory; the
//! canonicalized path is the module id. Ids move through `importing` while
//! their top-level runs and into `imported` once it has run — meeting an id
//! already in `importing` is a circular import.

use std::path::{Component, Path, PathBuf};

use super::error::{ErrorKind, RuntimeError};
use super::Interpreter;
use crate::parser::{source, Parser};

impl Interpreter {
    pub(super) fn import_module(&mut self, module_name: &str) -> Result<(), RuntimeError> {
        // `math` is built in; importing it just unlocks its builtins.
        if module_name == "math" {
            self.imported_modules.insert(module_name.to_string());
            return Ok(());
        }

        let module_path = self.resolve_module_path(module_name);
        let module_id = std::fs::canonicalize(&module_path)
            .unwrap_or_else(|_| normalize_path(&module_path))
            .to_string_lossy()
            .into_owned();

        if self.imported_modules.contains(&module_id) {
            return Ok(());
        }

        if self.importing_modules.contains(&module_id) {
            return Err(RuntimeError::circular_import(&module_id));
        }

        self.importing_modules.insert(module_id.clone());
        let executed = self.execute_module_file(&module_path);
        self.importing_modules.remove(&module_id);

        executed?;
        self.imported_modules.insert(module_id);
        Ok(())
    }

    fn execute_module_file(&mut self, module_path: &Path) -> Result<(), RuntimeError> {
        let lines = source::load_lines(module_path).map_err(|e| {
            RuntimeError::new(
                ErrorKind::Module,
                format!("error importing module '{}': {}", module_path.display(), e),
            )
        })?;

        let program = Parser::new(lines).parse().map_err(|diagnostic| {
            RuntimeError::new(
                ErrorKind::Module,
                format!(
                    "parse error importing module '{}' at line {}, column {}: {}",
                    module_path.display(),
                    diagnostic.line,
                    diagnostic.column,
                    diagnostic.message
                ),
            )
        })?;

        let base_dir = module_path.parent().unwrap_or(Path::new("")).to_path_buf();
        self.module_base_dirs.push(base_dir);
        let executed = self.execute_block(&program.statements);
        self.module_base_dirs.pop();
        executed
    }

    /// Turn a module name into a candidate path: dots become path
    /// separators, and `.clot` is appended when there is no extension.
    fn resolve_module_path(&self, module_name: &str) -> PathBuf {
        let relative = module_name.replace('.', std::path::MAIN_SEPARATOR_STR);
        let mut candidate = self.current_base_dir().join(relative);
        if candidate.extension().is_none() {
            candidate.set_extension("clot");
        }
        candidate
    }

    fn current_base_dir(&self) -> PathBuf {
        if let Some(dir) = self.module_base_dirs.last() {
            return dir.clone();
        }

        if let Some(parent) = self.entry_file.as_ref().and_then(|file| file.parent()) {
            return parent.to_path_buf();
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Lexical normalization for paths that cannot be canonicalized (e.g. the
/// file does not exist yet when the id is formed for an error message).
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
