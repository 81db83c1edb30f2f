//! Expression pipeline: validation, infix to postfix conversion, postfix
//! calculation, and the numeric and string evaluators that drive them.
//!
//! Statements carry their expressions as raw token runs. The interpreter
//! hands a run to `evaluator`, which either resolves it to a number through
//! validator → converter → calculator, or joins it as a `+`-separated string
//! concatenation.

pub mod calculator;
pub mod converter;
pub mod evaluator;
pub mod validator;

use thiserror::Error;

use crate::error::{Diagnostic, PascalError};

pub use calculator::calculate;
pub use converter::{convert, priority};
pub use evaluator::{evaluate_either, evaluate_numeric, evaluate_string, Operand};
pub use validator::validate;

/// Failures raised inside the expression pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    // validation
    #[error("Invalid token '{0}' in expression")]
    InvalidToken(String),
    #[error("Closing parenthesis is not matched")]
    UnmatchedClosingParen,
    #[error("One or more opening parentheses are not paired")]
    UnpairedOpeningParen,

    // calculation
    #[error("Operand value not found for identifier: {0}")]
    UnboundOperand(String),
    #[error("Invalid numeric literal: {0}")]
    InvalidLiteral(String),
    #[error("Invalid postfix expression: insufficient operands for operator {0}")]
    MissingOperands(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Modulo by zero")]
    ModuloByZero,
    #[error("Integer division by zero")]
    IntegerDivisionByZero,
    #[error("Unexpected token in postfix expression: {0}")]
    UnexpectedToken(String),
    #[error("Invalid postfix expression: too many operands or too few operators")]
    MalformedPostfix,

    // resolution
    #[error("Undeclared identifier: {0}")]
    UndeclaredIdentifier(String),
    #[error("String variable in arithmetic expression: {0}")]
    StringInArithmetic(String),
    #[error("Invalid string expression")]
    InvalidStringExpression,
    #[error("Invalid string expression: unexpected token '{0}'")]
    UnexpectedStringToken(String),
    #[error("Type error: Identifier '{0}' has unsuitable type")]
    NotAString(String),
}

impl ExprError {
    /// Validation failures are expression errors; everything else happens
    /// while evaluating.
    pub fn kind(&self) -> PascalError {
        match self {
            Self::InvalidToken(_) | Self::UnmatchedClosingParen | Self::UnpairedOpeningParen => {
                PascalError::Expression
            }
            _ => PascalError::Evaluation,
        }
    }
}

impl From<ExprError> for Diagnostic {
    fn from(err: ExprError) -> Self {
        Diagnostic::new(err.kind()).with_detail(err.to_string())
    }
}

/// Tokenize a snippet for expression tests.
#[cfg(test)]
pub(crate) fn tokens(source: &str) -> Vec<crate::lexer::Token> {
    crate::lexer::Lexer::new(source).tokenize().unwrap()
}

/// Lexemes of a token run joined by spaces.
#[cfg(test)]
pub(crate) fn lexemes(tokens: &[crate::lexer::Token]) -> String {
    tokens
        .iter()
        .map(|t| t.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
