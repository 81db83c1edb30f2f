//! Infix to postfix conversion (shunting-yard).
//!
//! A `-` in operand position is unary: it is rewritten to `UnaryMinus`
//! (lexeme `_`) and pushed without popping, so it lands right after its
//! operand in the output.

use tracing::trace;

use crate::lexer::{Token, TokenKind};

/// Binding strength of an arithmetic operator; `None` for anything else.
pub const fn priority(kind: TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Plus | TokenKind::Minus => Some(1),
        TokenKind::Multiply | TokenKind::Divide | TokenKind::Div | TokenKind::Mod => Some(2),
        TokenKind::UnaryMinus => Some(3),
        _ => None,
    }
}

/// Convert a validated infix run to postfix order.
pub fn convert(infix: &[Token]) -> Vec<Token> {
    let mut stack: Vec<Token> = Vec::new();
    let mut out: Vec<Token> = Vec::with_capacity(infix.len());
    let mut expect_operand = true;

    for token in infix {
        match token.kind {
            TokenKind::LeftParen => {
                stack.push(token.clone());
                expect_operand = true;
            }
            TokenKind::RightParen => {
                while let Some(top) = stack.pop() {
                    if top.kind == TokenKind::LeftParen {
                        break;
                    }
                    out.push(top);
                }
                expect_operand = false;
            }
            TokenKind::Minus if expect_operand => {
                stack.push(Token::new(TokenKind::UnaryMinus, "_", token.loc.clone()));
            }
            kind => match priority(kind) {
                Some(incoming) => {
                    while let Some(top) = stack.last() {
                        match priority(top.kind) {
                            Some(p) if p >= incoming => {
                                if let Some(top) = stack.pop() {
                                    out.push(top);
                                }
                            }
                            _ => break,
                        }
                    }
                    stack.push(token.clone());
                    expect_operand = true;
                }
                None => {
                    out.push(token.clone());
                    expect_operand = false;
                }
            },
        }
    }

    while let Some(top) = stack.pop() {
        out.push(top);
    }

    trace!(
        postfix = %out.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>().join(" "),
        "converted expression"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{lexemes, tokens};

    fn postfix(source: &str) -> String {
        lexemes(&convert(&tokens(source)))
    }

    #[test]
    fn precedence() {
        assert_eq!(postfix("2 + 3 * 4"), "2 3 4 * +");
        assert_eq!(postfix("2 * 3 + 4"), "2 3 * 4 +");
        assert_eq!(postfix("a div b mod c"), "a b div c mod");
    }

    #[test]
    fn left_associative() {
        assert_eq!(postfix("10 - 4 - 3"), "10 4 - 3 -");
        assert_eq!(postfix("8 / 2 / 2"), "8 2 / 2 /");
    }

    #[test]
    fn parentheses() {
        assert_eq!(postfix("(2 + 3) * 4"), "2 3 + 4 *");
        assert_eq!(postfix("((1 + 2) * (3 - 4))"), "1 2 + 3 4 - *");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(postfix("-5"), "5 _");
        assert_eq!(postfix("3 * (-4 + 2)"), "3 4 _ 2 + *");
        assert_eq!(postfix("3 * -(4 + 2)"), "3 4 2 + _ *");
        assert_eq!(postfix("2 - -3"), "2 3 _ -");
        assert_eq!(postfix("-2 + 3"), "2 _ 3 +");
        assert_eq!(postfix("- - 5"), "5 _ _");
    }

    #[test]
    fn unary_marker_kind() {
        let out = convert(&tokens("-x"));
        assert_eq!(out[1].kind, TokenKind::UnaryMinus);
        assert_eq!(out[1].lexeme, "_");
    }

    #[test]
    fn priority_table() {
        assert_eq!(priority(TokenKind::Plus), Some(1));
        assert_eq!(priority(TokenKind::Mod), Some(2));
        assert_eq!(priority(TokenKind::UnaryMinus), Some(3));
        assert_eq!(priority(TokenKind::LeftParen), None);
    }
}
