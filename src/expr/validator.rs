//! Pre-conversion checks on an arithmetic token run.

use crate::lexer::{Token, TokenKind};

use super::ExprError;

/// Check that every token may appear in an arithmetic expression and that
/// parentheses balance. A lone string literal is always accepted.
pub fn validate(tokens: &[Token]) -> Result<(), ExprError> {
    if let [only] = tokens {
        if only.kind == TokenKind::StringLiteral {
            return Ok(());
        }
    }
    check_tokens(tokens)?;
    check_parentheses(tokens)
}

fn is_expression_token(kind: TokenKind) -> bool {
    kind.is_numeric_literal()
        || kind.is_arithmetic_operator()
        || matches!(
            kind,
            TokenKind::Identifier | TokenKind::LeftParen | TokenKind::RightParen
        )
}

fn check_tokens(tokens: &[Token]) -> Result<(), ExprError> {
    match tokens.iter().find(|t| !is_expression_token(t.kind)) {
        Some(bad) => Err(ExprError::InvalidToken(bad.lexeme.clone())),
        None => Ok(()),
    }
}

fn check_parentheses(tokens: &[Token]) -> Result<(), ExprError> {
    let mut open: Vec<&Token> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::LeftParen => open.push(token),
            TokenKind::RightParen => {
                open.pop().ok_or(ExprError::UnmatchedClosingParen)?;
            }
            _ => {}
        }
    }
    if open.is_empty() {
        Ok(())
    } else {
        Err(ExprError::UnpairedOpeningParen)
    }
}
