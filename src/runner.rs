use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::{Interpreter, OutputSink};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Pipeline glue: scan → parse → resolve → interpret, rendering diagnostics
/// along the way.
///
/// A `Runner` owns one interpreter for its whole lifetime, so global state
/// persists across `run` calls — that is what makes the REPL stateful.
pub struct Runner {
    interpreter: Interpreter,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Runner {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(out: OutputSink) -> Self {
        Runner {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Run one program. Each stage halts the pipeline on error; everything
    /// user-visible goes through the interpreter's output sink.
    pub fn run(&mut self, source: &str) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut lex_errors: Vec<LoxError> = Vec::new();

        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => lex_errors.push(e),
            }
        }

        if !lex_errors.is_empty() {
            debug!("Halting after {} lexical error(s)", lex_errors.len());

            self.report_many("There were lexical errors:", &lex_errors);
            return;
        }

        let mut parser: Parser = Parser::new(tokens);
        let statements: Vec<Stmt> = parser.parse();

        if parser.had_error() {
            debug!("Halting after {} syntax error(s)", parser.errors().len());

            self.report_many("There were syntax errors:", parser.errors());
            return;
        }

        let mut resolver: Resolver = Resolver::new(&mut self.interpreter);

        if let Err(e) = resolver.resolve(&statements) {
            self.report_one(&e);
            return;
        }

        info!("Executing {} statement(s)", statements.len());

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.report_one(&e);
        }
    }

    fn report_many(&self, header: &str, errors: &[LoxError]) {
        let out: OutputSink = self.interpreter.output();
        let mut out = out.borrow_mut();

        let _ = writeln!(out, "{}", header);

        for e in errors {
            let _ = writeln!(out, "  {}", e);
        }
    }

    fn report_one(&self, error: &LoxError) {
        let out: OutputSink = self.interpreter.output();
        let mut out = out.borrow_mut();

        let _ = writeln!(out, "{}", error);
    }
}
