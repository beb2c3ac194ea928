//! Console capability for the interpreter's host-side I/O.
//!
//! Print and input builtins go through this seam so tests can capture
//! output and script input deterministically.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Host console interface
pub trait ConsoleCapability {
    /// Write text without a newline and flush
    fn print(&self, text: &str);

    /// Write text followed by a newline
    fn println(&self, text: &str);

    /// Read one line from standard input; `None` on end of input
    fn read_line(&self) -> Option<String>;
}

/// Real console backed by the process's standard streams
pub struct RealConsole;

impl ConsoleCapability for RealConsole {
    fn print(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }

    fn println(&self, text: &str) {
        println!("{}", text);
    }

    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(_) => None,
        }
    }
}

/// Console for tests: captures output in a shared buffer and serves
/// scripted input lines.
pub struct MockConsole {
    output: Rc<RefCell<String>>,
    input: RefCell<VecDeque<String>>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self {
            output: Rc::new(RefCell::new(String::new())),
            input: RefCell::new(VecDeque::new()),
        }
    }

    pub fn with_input(lines: &[&str]) -> Self {
        let console = Self::new();
        console
            .input
            .borrow_mut()
            .extend(lines.iter().map(|line| line.to_string()));
        console
    }

    /// Shared handle to the captured output; remains readable after the
    /// console has been moved into an interpreter.
    pub fn output(&self) -> Rc<RefCell<String>> {
        Rc::clone(&self.output)
    }
}

impl Default for MockConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleCapability for MockConsole {
    fn print(&self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn println(&self, text: &str) {
        let mut output = self.output.borrow_mut();
        output.push_str(text);
        output.push('\n');
    }

    fn read_line(&self) -> Option<String> {
        self.input.borrow_mut().pop_front()
    }
}
