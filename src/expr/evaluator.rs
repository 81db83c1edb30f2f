//! Numeric and string evaluation of a raw token run against an environment.

use std::collections::HashMap;

use tracing::trace;

use crate::env::Environment;
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

use super::{calculate, convert, validate, ExprError};

/// Result of evaluating a run whose type is not known up front.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
        }
    }
}

/// Evaluate an arithmetic run. An empty run is `0`.
pub fn evaluate_numeric(tokens: &[Token], env: &Environment) -> Result<f64, ExprError> {
    if tokens.is_empty() {
        return Ok(0.0);
    }

    let mut bindings: HashMap<String, f64> = HashMap::new();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Identifier) {
        let value = env
            .lookup(&token.lexeme)
            .ok_or_else(|| ExprError::UndeclaredIdentifier(token.lexeme.clone()))?;
        let number = value
            .as_number()
            .ok_or_else(|| ExprError::StringInArithmetic(token.lexeme.clone()))?;
        bindings.insert(token.lexeme.clone(), number);
    }

    validate(tokens)?;
    let postfix = convert(tokens);
    let result = calculate(&postfix, &bindings)?;
    trace!(result, "numeric expression");
    Ok(result)
}

/// Evaluate a `+`-joined run of string literals and string identifiers.
/// An empty run is the empty string.
pub fn evaluate_string(tokens: &[Token], env: &Environment) -> Result<String, ExprError> {
    let mut out = String::new();
    let mut is_first_token = true;
    let mut last_was_sign = false;

    for token in tokens {
        match token.kind {
            TokenKind::Plus => {
                if is_first_token || last_was_sign {
                    return Err(ExprError::InvalidStringExpression);
                }
                last_was_sign = true;
            }
            TokenKind::StringLiteral | TokenKind::Identifier => {
                if !is_first_token && !last_was_sign {
                    return Err(ExprError::InvalidStringExpression);
                }
                out.push_str(&string_operand(token, env)?);
                last_was_sign = false;
            }
            _ => return Err(ExprError::UnexpectedStringToken(token.lexeme.clone())),
        }
        is_first_token = false;
    }

    if last_was_sign {
        return Err(ExprError::InvalidStringExpression);
    }
    Ok(out)
}

fn string_operand(token: &Token, env: &Environment) -> Result<String, ExprError> {
    if token.kind == TokenKind::StringLiteral {
        return Ok(token.lexeme.clone());
    }
    match env.lookup(&token.lexeme) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(_) => Err(ExprError::NotAString(token.lexeme.clone())),
        None => Err(ExprError::UndeclaredIdentifier(token.lexeme.clone())),
    }
}

/// Try the numeric path, then the string path.
///
/// When both fail, the string error is reported if the run looks like string
/// work (it holds a string literal, or names a string variable); otherwise
/// the numeric error is.
pub fn evaluate_either(tokens: &[Token], env: &Environment) -> Result<Operand, ExprError> {
    let numeric_err = match evaluate_numeric(tokens, env) {
        Ok(n) => return Ok(Operand::Number(n)),
        Err(err) => err,
    };
    let string_err = match evaluate_string(tokens, env) {
        Ok(s) => return Ok(Operand::Text(s)),
        Err(err) => err,
    };

    let stringy = matches!(numeric_err, ExprError::StringInArithmetic(_))
        || tokens.iter().any(|t| t.kind == TokenKind::StringLiteral);
    Err(if stringy { string_err } else { numeric_err })
}
