//! Setsuna - a small functional programming language.
//!
//! This library provides the full pipeline for running Setsuna programs:
//! lexing, parsing, evaluation, and a companion Hindley-Milner type
//! inferencer.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use interpreter::{Evaluator, Value};

/// Run a source string through the whole pipeline against a fresh global
/// environment: lex, parse, evaluate. Returns the value of the last
/// top-level expression, or unit.
pub fn evaluate(source: &str, filename: &str) -> Result<Value> {
    let tokens = lexer::tokenize(source, filename)?;
    let program = parser::parse(tokens)?;
    let mut evaluator = Evaluator::with_builtins();
    evaluator.eval_program(&program)
}
