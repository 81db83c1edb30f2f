#![allow(clippy::return_self_not_must_use)]

pub mod ast;
pub mod env;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

use std::io::{BufRead, Write};

use tracing::info_span;

use crate::ast::Program;
use crate::env::Environment;
use crate::error::PascalResult;
use crate::interpreter::Interpreter;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;

pub fn tokenize(source: &str) -> PascalResult<Vec<Token>> {
    let _span = info_span!("pascal.lex").entered();
    Lexer::new(source).tokenize()
}

pub fn parse_source(source: &str) -> PascalResult<Program> {
    let tokens = tokenize(source)?;
    let _span = info_span!("pascal.parse").entered();
    Parser::new(tokens).parse()
}

/// Lex, parse and run `source`, reading `Read` lines from `input` and
/// writing `Write` lines to `output`. Returns the final environment.
pub fn run_source<R: BufRead, W: Write>(
    source: &str,
    input: R,
    output: W,
) -> PascalResult<Environment> {
    let program = parse_source(source)?;
    let _span = info_span!("pascal.run").entered();
    let mut interpreter = Interpreter::new(&program, input, output);
    interpreter.run()?;
    Ok(interpreter.environment().clone())
}
