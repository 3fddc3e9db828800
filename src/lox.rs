//! The `run` pipeline: scan → parse → resolve → interpret.
//!
//! A [`Lox`] session keeps one interpreter alive across runs, so a REPL's
//! lines see each other's global definitions.

use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use log::{debug, info};
use thiserror::Error;

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status for static (scan/parse/resolve) errors.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for an uncaught runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// At least one static diagnostic; nothing was executed.
    #[error("{}", Diagnostics(.0))]
    Static(Vec<LoxError>),

    /// Execution stopped at this error.
    #[error("{0}")]
    Runtime(LoxError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => EXIT_STATIC_ERROR,
            RunError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

/// Newline‑separated rendering of a diagnostic list.
struct Diagnostics<'e>(&'e [LoxError]);

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }

        Ok(())
    }
}

/// One interpreter session.
pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` output goes to `out`.
    pub fn with_output<W: Write + 'static>(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Runs one piece of source text.  Execution only starts when scanning,
    /// parsing and resolution were all clean.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} bytes of source", source.len());

        let (tokens, mut errors) = Scanner::new(source).scan_all();

        let statements: Vec<Stmt> = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(RunError::Static(errors));
            }
        };

        if !errors.is_empty() {
            return Err(RunError::Static(errors));
        }

        debug!("Parsed {} statements", statements.len());

        let known_globals: HashSet<String> = self
            .interpreter
            .globals()
            .borrow()
            .names()
            .map(str::to_string)
            .collect();

        Resolver::with_globals(known_globals)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }
}
