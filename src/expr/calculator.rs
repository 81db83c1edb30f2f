//! Postfix evaluation over `f64`.

use std::collections::HashMap;

use crate::lexer::{Token, TokenKind};

use super::ExprError;

/// Evaluate a postfix run. Identifiers resolve through `bindings`; integer
/// and double literals both become `f64`.
pub fn calculate(postfix: &[Token], bindings: &HashMap<String, f64>) -> Result<f64, ExprError> {
    let mut stack: Vec<f64> = Vec::new();

    for token in postfix {
        match token.kind {
            TokenKind::IntegerLiteral | TokenKind::DoubleLiteral => {
                let value = token
                    .lexeme
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidLiteral(token.lexeme.clone()))?;
                stack.push(value);
            }
            TokenKind::Identifier => {
                let value = bindings
                    .get(&token.lexeme)
                    .ok_or_else(|| ExprError::UnboundOperand(token.lexeme.clone()))?;
                stack.push(*value);
            }
            TokenKind::UnaryMinus => {
                let operand = stack
                    .pop()
                    .ok_or_else(|| ExprError::MissingOperands(token.lexeme.clone()))?;
                stack.push(-operand);
            }
            kind if kind.is_arithmetic_operator() => {
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(ExprError::MissingOperands(token.lexeme.clone()));
                };
                stack.push(apply(kind, left, right)?);
            }
            _ => return Err(ExprError::UnexpectedToken(token.lexeme.clone())),
        }
    }

    match stack.as_slice() {
        [result] => Ok(*result),
        _ => Err(ExprError::MalformedPostfix),
    }
}

fn apply(op: TokenKind, left: f64, right: f64) -> Result<f64, ExprError> {
    match op {
        TokenKind::Plus => Ok(left + right),
        TokenKind::Minus => Ok(left - right),
        TokenKind::Multiply => Ok(left * right),
        TokenKind::Divide if right == 0.0 => Err(ExprError::DivisionByZero),
        TokenKind::Divide => Ok(left / right),
        TokenKind::Mod if right == 0.0 => Err(ExprError::ModuloByZero),
        // `%` on f64 is the truncated remainder, same as C's fmod.
        TokenKind::Mod => Ok(left % right),
        TokenKind::Div if right == 0.0 => Err(ExprError::IntegerDivisionByZero),
        TokenKind::Div => Ok((left / right).floor()),
        other => Err(ExprError::UnexpectedToken(other.describe().to_string())),
    }
}
