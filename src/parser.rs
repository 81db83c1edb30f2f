//! Pascal-- recursive descent parser — tokens to block list.
//!
//! Consumes a `Vec<Token>` from the lexer and produces an `ast::Program`.
//! The grammar is purely structural: assignment right-hand sides, `Write`
//! arguments and `if` conditions are captured as raw token runs and left
//! for the expression pipeline.

use tracing::debug;

use crate::ast::{Block, DeclaredType, IdentifierList, Node, NodeKind, Program};
use crate::error::{Diagnostic, PascalResult, SourceLoc};
use crate::lexer::{Token, TokenKind};
use crate::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> PascalResult<Program> {
        let mut blocks = Vec::new();

        let loc = self.loc();
        self.expect(TokenKind::Program, "'program'")?;
        let name = self.expect(TokenKind::Identifier, "program name")?.lexeme;
        self.expect(TokenKind::Semicolon, "';'")?;
        blocks.push(vec![Node::new(NodeKind::ProgramHeader { name }, loc)]);

        if self.check(TokenKind::Const) {
            blocks.push(self.parse_const_section()?);
            if !self.check(TokenKind::Var) && !self.check(TokenKind::Begin) {
                return Err(self.unexpected("'var' or 'begin' after constant declarations"));
            }
        }

        if self.check(TokenKind::Var) {
            blocks.push(self.parse_var_section()?);
            if !self.check(TokenKind::Begin) {
                return Err(self.unexpected("'begin' after variable declarations"));
            }
        }

        blocks.push(self.parse_begin_section()?);
        self.expect(TokenKind::EndOfProgram, "'end.'")?;

        if let Some(extra) = self.peek() {
            return Err(Diagnostic::syntax(format!(
                "unexpected {} after 'end.'",
                found(extra)
            ))
            .at(extra.loc.clone()));
        }

        debug!(blocks = blocks.len(), "parsed program");
        Ok(Program { blocks })
    }

    // ── helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Peek ahead by `n` tokens (0 = current).
    fn peek_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Location of the current token, or of the last one at end of input.
    fn loc(&self) -> SourceLoc {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.loc.clone())
            .unwrap_or_else(|| SourceLoc::new(1, 1))
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PascalResult<Token> {
        if self.check(kind) {
            if let Some(tok) = self.advance() {
                return Ok(tok);
            }
        }
        Err(self.unexpected(what))
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let found = self.peek().map_or_else(|| "end of input".to_string(), found);
        Diagnostic::syntax(format!("expected {expected}, found {found}")).at(self.loc())
    }

    // ── declarations ─────────────────────────────────────────────────

    fn parse_const_section(&mut self) -> PascalResult<Block> {
        let loc = self.loc();
        self.expect(TokenKind::Const, "'const'")?;
        let mut block = vec![Node::new(NodeKind::ConstSection, loc)];
        block.push(self.parse_const_declaration()?);
        while self.check(TokenKind::Identifier) {
            block.push(self.parse_const_declaration()?);
        }
        Ok(block)
    }

    fn parse_const_declaration(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        let identifier = self.expect(TokenKind::Identifier, "constant identifier")?.lexeme;
        self.expect(TokenKind::Colon, "':'")?;
        let declared_type = self.parse_type()?;
        self.expect(TokenKind::Equal, "'='")?;
        let value = self.parse_literal()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Node::new(
            NodeKind::ConstDeclaration {
                identifier,
                declared_type,
                value,
            },
            loc,
        ))
    }

    fn parse_var_section(&mut self) -> PascalResult<Block> {
        let loc = self.loc();
        self.expect(TokenKind::Var, "'var'")?;
        let mut block = vec![Node::new(NodeKind::VarSection, loc)];
        block.push(self.parse_var_declaration()?);
        while self.check(TokenKind::Identifier) {
            block.push(self.parse_var_declaration()?);
        }
        Ok(block)
    }

    fn parse_var_declaration(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        let identifiers = self.parse_identifier_list()?;
        self.expect(TokenKind::Colon, "':'")?;
        let declared_type = self.parse_type()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Node::new(
            NodeKind::VariableDeclaration {
                identifiers,
                declared_type,
            },
            loc,
        ))
    }

    fn parse_identifier_list(&mut self) -> PascalResult<IdentifierList> {
        let mut names = vec![self.expect(TokenKind::Identifier, "identifier")?.lexeme];
        while self.eat(TokenKind::Comma) {
            names.push(self.expect(TokenKind::Identifier, "identifier")?.lexeme);
        }
        Ok(IdentifierList::new(names))
    }

    fn parse_type(&mut self) -> PascalResult<DeclaredType> {
        let ty = match self.peek_kind() {
            Some(TokenKind::IntegerType) => DeclaredType::Integer,
            Some(TokenKind::DoubleType) => DeclaredType::Double,
            Some(TokenKind::StringType) => DeclaredType::String,
            _ => return Err(self.unexpected("'integer', 'double' or 'string'")),
        };
        self.pos += 1;
        Ok(ty)
    }

    /// A constant literal. Numeric literals may carry a leading `-`.
    fn parse_literal(&mut self) -> PascalResult<Value> {
        let negative = self.check(TokenKind::Minus)
            && matches!(
                self.peek_at(1),
                Some(TokenKind::IntegerLiteral | TokenKind::DoubleLiteral)
            );
        if negative {
            self.pos += 1;
        }
        let sign = if negative { "-" } else { "" };

        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("a literal"));
        };
        let value = match tok.kind {
            TokenKind::IntegerLiteral => {
                let text = format!("{sign}{}", tok.lexeme);
                let n = text.parse::<i64>().map_err(|_| {
                    Diagnostic::syntax(format!("integer literal out of range: {text}"))
                        .at(tok.loc.clone())
                })?;
                Value::Int(n)
            }
            TokenKind::DoubleLiteral => {
                let text = format!("{sign}{}", tok.lexeme);
                let d = text.parse::<f64>().map_err(|_| {
                    Diagnostic::syntax(format!("invalid double literal: {text}"))
                        .at(tok.loc.clone())
                })?;
                Value::Double(d)
            }
            TokenKind::StringLiteral => Value::Str(tok.lexeme.clone()),
            _ => return Err(self.unexpected("a literal")),
        };
        self.pos += 1;
        Ok(value)
    }

    // ── statements ───────────────────────────────────────────────────

    fn parse_begin_section(&mut self) -> PascalResult<Block> {
        let loc = self.loc();
        self.expect(TokenKind::Begin, "'begin'")?;
        let mut block = vec![Node::new(NodeKind::BeginSection, loc)];
        loop {
            match self.peek_kind() {
                Some(TokenKind::EndOfProgram) => break,
                Some(TokenKind::End) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Semicolon) => self.pos += 1,
                _ => block.push(self.parse_statement()?),
            }
        }
        Ok(block)
    }

    fn parse_statement(&mut self) -> PascalResult<Node> {
        match self.peek_kind() {
            Some(TokenKind::Identifier) => self.parse_assignment(),
            Some(TokenKind::Write) => self.parse_write(),
            Some(TokenKind::Read) => self.parse_read(),
            Some(TokenKind::If) => self.parse_if(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_assignment(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        let target = self.expect(TokenKind::Identifier, "variable identifier")?.lexeme;
        self.expect(TokenKind::Assign, "':='")?;

        let mut expr = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Semicolon) => break,
                // `x := 1 y := 2` is a missing semicolon, not a long expression
                Some(TokenKind::Identifier) if self.peek_at(1) == Some(TokenKind::Assign) => {
                    return Err(self.unexpected("';'"));
                }
                Some(kind) if is_expression_part(kind) => {
                    if let Some(tok) = self.advance() {
                        expr.push(tok);
                    }
                }
                _ => return Err(self.unexpected("';'")),
            }
        }

        if expr.is_empty() {
            return Err(Diagnostic::syntax(format!(
                "expected an expression after ':=' for variable '{target}'"
            ))
            .at(loc));
        }
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Node::new(NodeKind::Assignment { target, expr }, loc))
    }

    fn parse_write(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        self.expect(TokenKind::Write, "'Write'")?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let args = self.collect_parenthesized(|kind, depth| {
            is_expression_part(kind) || (kind == TokenKind::Comma && depth == 0)
        })?;

        if args.first().is_some_and(|t| t.kind == TokenKind::Comma) {
            return Err(Diagnostic::syntax("leading comma in Write arguments").at(loc));
        }
        if args.last().is_some_and(|t| t.kind == TokenKind::Comma) {
            return Err(Diagnostic::syntax("trailing comma in Write arguments").at(loc));
        }

        self.expect(TokenKind::RightParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Node::new(NodeKind::Write { args }, loc))
    }

    fn parse_read(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        self.expect(TokenKind::Read, "'Read'")?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let identifiers = self.parse_identifier_list()?;
        self.expect(TokenKind::RightParen, "')'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Node::new(NodeKind::Read { identifiers }, loc))
    }

    fn parse_if(&mut self) -> PascalResult<Node> {
        let loc = self.loc();
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let condition =
            self.collect_parenthesized(|kind, _| is_expression_part(kind) || kind.is_comparison())?;
        self.expect(TokenKind::RightParen, "')'")?;
        self.expect(TokenKind::Then, "'then'")?;

        let (then_block, mut ended_in_block) = self.parse_statement_block()?;
        let else_block = if self.eat(TokenKind::Else) {
            let (block, is_compound) = self.parse_statement_block()?;
            ended_in_block = is_compound;
            Some(block)
        } else {
            None
        };
        if ended_in_block {
            self.eat(TokenKind::Semicolon);
        }

        Ok(Node::new(
            NodeKind::If {
                condition,
                then_block,
                else_block,
            },
            loc,
        ))
    }

    /// A `begin ... end` block or a single statement. The flag reports
    /// whether it was a `begin ... end` block.
    fn parse_statement_block(&mut self) -> PascalResult<(Block, bool)> {
        if !self.eat(TokenKind::Begin) {
            return Ok((vec![self.parse_statement()?], false));
        }
        let mut block = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::End) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Semicolon) => self.pos += 1,
                None | Some(TokenKind::EndOfProgram) => return Err(self.unexpected("'end'")),
                _ => block.push(self.parse_statement()?),
            }
        }
        Ok((block, true))
    }

    /// Collect tokens up to (not including) the `)` that closes an already
    /// consumed `(`. Tokens rejected by `allowed` at their nesting depth are
    /// a syntax error.
    fn collect_parenthesized(
        &mut self,
        allowed: impl Fn(TokenKind, usize) -> bool,
    ) -> PascalResult<Vec<Token>> {
        let mut run = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                Some(TokenKind::RightParen) if depth == 0 => return Ok(run),
                Some(TokenKind::RightParen) => depth -= 1,
                Some(TokenKind::LeftParen) => depth += 1,
                Some(kind) if allowed(kind, depth) => {}
                _ => return Err(self.unexpected("')'")),
            }
            if let Some(tok) = self.advance() {
                run.push(tok);
            }
        }
    }
}

/// Tokens that may appear inside an arithmetic or string expression.
fn is_expression_part(kind: TokenKind) -> bool {
    kind.is_operand()
        || kind.is_arithmetic_operator()
        || matches!(kind, TokenKind::LeftParen | TokenKind::RightParen)
}

fn found(tok: &Token) -> String {
    match tok.kind {
        TokenKind::Identifier
        | TokenKind::IntegerLiteral
        | TokenKind::DoubleLiteral
        | TokenKind::Unknown => format!("{} '{}'", tok.kind.describe(), tok.lexeme),
        TokenKind::StringLiteral => format!("string literal \"{}\"", tok.lexeme),
        kind => kind.describe().to_string(),
    }
}
