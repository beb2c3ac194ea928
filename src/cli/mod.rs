//! Command-line interface for the Clot interpreter
//!
//! Thin driver around the core: load the source file, parse it, run it.
//! Any parse or runtime failure maps to a non-zero exit with the diagnostic
//! (translated at this boundary) on stderr.

use clap::Parser as ClapParser;
use std::path::PathBuf;

use crate::interpreter::Interpreter;
use crate::parser::{source, Parser};
use crate::runtime::i18n::{self, Language};

/// Clot - a small imperative scripting language
#[derive(ClapParser, Debug)]
#[command(name = "clot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source file to run
    pub file: PathBuf,

    /// Diagnostic language (es/en); defaults to CLOT_LANG or English
    #[arg(long)]
    pub lang: Option<String>,

    /// Output diagnostics as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Run the CLI
    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::parse();
        let language = i18n::language_from(cli.lang.as_deref())?;
        run_file(&cli.file, language, cli.json)
    }
}

/// Parse and execute a source file.
pub fn run_file(
    file: &PathBuf,
    language: Language,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines = source::load_lines(file).map_err(|e| {
        i18n::translate(
            language,
            &format!("could not open file: {}: {}", file.display(), e),
        )
    })?;

    let program = Parser::new(lines)
        .parse()
        .map_err(|diagnostic| -> Box<dyn std::error::Error> {
            if json {
                serde_json::to_string(&diagnostic)
                    .unwrap_or_else(|_| diagnostic.to_string())
                    .into()
            } else {
                i18n::translate(language, &diagnostic.to_string()).into()
            }
        })?;

    let mut interpreter = Interpreter::new();
    interpreter.set_entry_file(file);
    interpreter
        .execute(&program)
        .map_err(|error| i18n::translate(language, &error.to_string()).into())
}
