//! Pascal-- lexer — tokenizes source text into a stream of tokens.
//!
//! The lexer is an explicit finite-state machine that consumes one character
//! per step. Multi-character tokens (identifiers, numbers, strings, `:=`,
//! `>=`, `<=`, `<>`) are accumulated in a state and emitted on the first
//! character that does not continue them. Keywords are case-sensitive.

use std::fmt;

use tracing::debug;

use crate::error::{Diagnostic, PascalResult, SourceLoc};

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Operands
    Identifier,
    IntegerLiteral,
    DoubleLiteral,
    StringLiteral,

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    Div,
    /// Synthetic marker produced by the postfix converter, lexeme `_`.
    UnaryMinus,

    // Comparison
    Equal,          // =
    NonEqual,       // <>
    Less,           // <
    Greater,        // >
    LessOrEqual,    // <=
    GreaterOrEqual, // >=

    // Punctuation
    Assign, // :=
    Semicolon,
    Colon,
    Comma,
    LeftParen,
    RightParen,

    // Declared types
    IntegerType,
    DoubleType,
    StringType,

    // Structure
    Program,
    Const,
    Var,
    Begin,
    End,
    If,
    Then,
    Else,
    Write,
    Read,
    /// `end.`
    EndOfProgram,

    Unknown,
}

impl TokenKind {
    /// Map a completed identifier to its keyword kind, if it is one.
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "program" => Self::Program,
            "const" => Self::Const,
            "var" => Self::Var,
            "begin" => Self::Begin,
            "end" => Self::End,
            "if" => Self::If,
            "then" => Self::Then,
            "else" => Self::Else,
            "mod" => Self::Mod,
            "div" => Self::Div,
            "integer" => Self::IntegerType,
            "double" => Self::DoubleType,
            "string" => Self::StringType,
            "Write" => Self::Write,
            "Read" => Self::Read,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_arithmetic_operator(self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Multiply
                | Self::Divide
                | Self::Mod
                | Self::Div
                | Self::UnaryMinus
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NonEqual
                | Self::Less
                | Self::Greater
                | Self::LessOrEqual
                | Self::GreaterOrEqual
        )
    }

    pub fn is_numeric_literal(self) -> bool {
        matches!(self, Self::IntegerLiteral | Self::DoubleLiteral)
    }

    /// Identifiers and literals of any type.
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::IntegerLiteral | Self::DoubleLiteral | Self::StringLiteral
        )
    }

    /// Human-readable name used in syntax errors.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::IntegerLiteral => "integer literal",
            Self::DoubleLiteral => "double literal",
            Self::StringLiteral => "string literal",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Multiply => "'*'",
            Self::Divide => "'/'",
            Self::Mod => "'mod'",
            Self::Div => "'div'",
            Self::UnaryMinus => "unary '-'",
            Self::Equal => "'='",
            Self::NonEqual => "'<>'",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::LessOrEqual => "'<='",
            Self::GreaterOrEqual => "'>='",
            Self::Assign => "':='",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::IntegerType => "'integer'",
            Self::DoubleType => "'double'",
            Self::StringType => "'string'",
            Self::Program => "'program'",
            Self::Const => "'const'",
            Self::Var => "'var'",
            Self::Begin => "'begin'",
            Self::End => "'end'",
            Self::If => "'if'",
            Self::Then => "'then'",
            Self::Else => "'else'",
            Self::Write => "'Write'",
            Self::Read => "'Read'",
            Self::EndOfProgram => "'end.'",
            Self::Unknown => "unknown token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token; string literals exclude their quotes.
    pub lexeme: String,
    /// Position of the token's first character.
    pub loc: SourceLoc,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, loc: SourceLoc) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            loc,
        }
    }

    pub fn line(&self) -> usize {
        self.loc.line
    }

    pub fn col(&self) -> usize {
        self.loc.col
    }
}

/// Lexer states. `Start` is the only state in which no token is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    InIdentifier,
    InInteger,
    InDouble,
    InString,
    AfterColon,
    AfterGreater,
    AfterLess,
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    lines: Vec<String>,
    state: LexState,
    lexeme: String,
    /// Location of the first character of the pending token.
    start: (usize, usize),
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(String::from).collect();
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            lines,
            state: LexState::Start,
            lexeme: String::new(),
            start: (1, 1),
        }
    }

    pub fn tokenize(&mut self) -> PascalResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            if let Some(token) = self.step(ch)? {
                tokens.push(token);
            }
        }
        if let Some(token) = self.finish()? {
            tokens.push(token);
        }

        debug!(count = tokens.len(), lines = self.line, "tokenized source");
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume the current character into the pending lexeme.
    fn take(&mut self, ch: char) {
        self.lexeme.push(ch);
        self.advance();
    }

    /// Begin a new pending token at the current position.
    fn enter(&mut self, state: LexState) {
        self.state = state;
        self.lexeme.clear();
        self.start = (self.line, self.col);
    }

    fn start_loc(&self) -> SourceLoc {
        SourceLoc::new(self.start.0, self.start.1)
    }

    /// Location with the source line attached, for diagnostics.
    fn error_loc(&self, line: usize, col: usize) -> SourceLoc {
        let loc = SourceLoc::new(line, col);
        match self.lines.get(line.wrapping_sub(1)) {
            Some(text) => loc.with_source(text.clone()),
            None => loc,
        }
    }

    /// Emit the pending token and return to `Start`.
    fn emit(&mut self, kind: TokenKind) -> Token {
        self.state = LexState::Start;
        Token::new(kind, std::mem::take(&mut self.lexeme), self.start_loc())
    }

    fn emit_word(&mut self) -> Token {
        let kind = TokenKind::keyword(&self.lexeme).unwrap_or(TokenKind::Identifier);
        self.emit(kind)
    }

    /// Feed one character to the state machine. Returns a token when the
    /// character completes one. Characters that terminate a pending token
    /// without belonging to it are left unconsumed for the next step.
    fn step(&mut self, ch: char) -> PascalResult<Option<Token>> {
        match self.state {
            LexState::Start => self.step_start(ch),

            LexState::InIdentifier => {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    self.take(ch);
                    Ok(None)
                } else if ch == '.' && self.lexeme == "end" {
                    self.take(ch);
                    Ok(Some(self.emit(TokenKind::EndOfProgram)))
                } else {
                    Ok(Some(self.emit_word()))
                }
            }

            LexState::InInteger => {
                if ch.is_ascii_digit() {
                    self.take(ch);
                    Ok(None)
                } else if ch == '.' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.take(ch);
                    self.state = LexState::InDouble;
                    Ok(None)
                } else {
                    Ok(Some(self.emit(TokenKind::IntegerLiteral)))
                }
            }

            LexState::InDouble => {
                if ch.is_ascii_digit() {
                    self.take(ch);
                    Ok(None)
                } else {
                    Ok(Some(self.emit(TokenKind::DoubleLiteral)))
                }
            }

            LexState::InString => {
                if ch == '"' {
                    self.advance();
                    Ok(Some(self.emit(TokenKind::StringLiteral)))
                } else {
                    self.take(ch);
                    Ok(None)
                }
            }

            LexState::AfterColon => {
                if ch == '=' {
                    self.take(ch);
                    Ok(Some(self.emit(TokenKind::Assign)))
                } else {
                    Ok(Some(self.emit(TokenKind::Colon)))
                }
            }

            LexState::AfterGreater => {
                if ch == '=' {
                    self.take(ch);
                    Ok(Some(self.emit(TokenKind::GreaterOrEqual)))
                } else {
                    Ok(Some(self.emit(TokenKind::Greater)))
                }
            }

            LexState::AfterLess => match ch {
                '=' => {
                    self.take(ch);
                    Ok(Some(self.emit(TokenKind::LessOrEqual)))
                }
                '>' => {
                    self.take(ch);
                    Ok(Some(self.emit(TokenKind::NonEqual)))
                }
                _ => Ok(Some(self.emit(TokenKind::Less))),
            },
        }
    }

    fn step_start(&mut self, ch: char) -> PascalResult<Option<Token>> {
        if ch.is_whitespace() {
            self.advance();
            return Ok(None);
        }

        let next = match ch {
            'a'..='z' | 'A'..='Z' | '_' => LexState::InIdentifier,
            '0'..='9' => LexState::InInteger,
            '"' => {
                // The opening quote is not part of the lexeme.
                self.enter(LexState::InString);
                self.advance();
                return Ok(None);
            }
            ':' => LexState::AfterColon,
            '>' => LexState::AfterGreater,
            '<' => LexState::AfterLess,
            _ => {
                let kind = match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Multiply,
                    '/' => TokenKind::Divide,
                    '=' => TokenKind::Equal,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    // A stray dot is left for the parser to reject in context.
                    '.' => TokenKind::Unknown,
                    _ => {
                        return Err(Diagnostic::lexical(format!("unexpected character '{ch}'"))
                            .at(self.error_loc(self.line, self.col)));
                    }
                };
                self.enter(LexState::Start);
                self.take(ch);
                return Ok(Some(self.emit(kind)));
            }
        };

        self.enter(next);
        self.take(ch);
        Ok(None)
    }

    /// Flush whatever token is pending at end of input.
    fn finish(&mut self) -> PascalResult<Option<Token>> {
        let token = match self.state {
            LexState::Start => return Ok(None),
            LexState::InIdentifier => self.emit_word(),
            LexState::InInteger => self.emit(TokenKind::IntegerLiteral),
            LexState::InDouble => self.emit(TokenKind::DoubleLiteral),
            LexState::AfterColon => self.emit(TokenKind::Colon),
            LexState::AfterGreater => self.emit(TokenKind::Greater),
            LexState::AfterLess => self.emit(TokenKind::Less),
            LexState::InString => {
                let (line, col) = self.start;
                return Err(Diagnostic::lexical(format!(
                    "unterminated string literal starting at line {line}, column {col}"
                ))
                .at(self.error_loc(line, col)));
            }
        };
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn positions(source: &str) -> Vec<(String, usize, usize)> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| (t.lexeme, t.loc.line, t.loc.col))
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(Lexer::new("").tokenize().unwrap().is_empty());
    }

    #[test]
    fn keywords_are_retyped() {
        assert_eq!(
            kinds("program const var begin end if then else mod div integer double string Write Read"),
            vec![
                TokenKind::Program,
                TokenKind::Const,
                TokenKind::Var,
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::If,
                TokenKind::Then,
                TokenKind::Else,
                TokenKind::Mod,
                TokenKind::Div,
                TokenKind::IntegerType,
                TokenKind::DoubleType,
                TokenKind::StringType,
                TokenKind::Write,
                TokenKind::Read,
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            kinds("write BEGIN Begin"),
            vec![TokenKind::Identifier; 3]
        );
    }

    #[test]
    fn identifier_columns() {
        assert_eq!(
            positions("variableName another_one _underscore var123"),
            vec![
                ("variableName".into(), 1, 1),
                ("another_one".into(), 1, 14),
                ("_underscore".into(), 1, 26),
                ("var123".into(), 1, 38),
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = Lexer::new("123 0.5 3.14159").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[1].kind, TokenKind::DoubleLiteral);
        assert_eq!(tokens[1].lexeme, "0.5");
        assert_eq!(tokens[2].loc.col, 9);
    }

    #[test]
    fn integer_followed_by_dot_without_digits() {
        assert_eq!(
            kinds("12."),
            vec![TokenKind::IntegerLiteral, TokenKind::Unknown]
        );
    }

    #[test]
    fn string_lexeme_excludes_quotes() {
        assert_eq!(
            positions("\"hello\" \" with spaces  \""),
            vec![("hello".into(), 1, 1), (" with spaces  ".into(), 1, 9)]
        );
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            kinds(": := = <> > < >= <="),
            vec![
                TokenKind::Colon,
                TokenKind::Assign,
                TokenKind::Equal,
                TokenKind::NonEqual,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::GreaterOrEqual,
                TokenKind::LessOrEqual,
            ]
        );
    }

    #[test]
    fn operators_at_end_of_input() {
        assert_eq!(kinds("a <"), vec![TokenKind::Identifier, TokenKind::Less]);
        assert_eq!(kinds("x :"), vec![TokenKind::Identifier, TokenKind::Colon]);
    }

    #[test]
    fn adjacent_tokens_without_spaces() {
        assert_eq!(
            kinds("x:=a+(b*2);"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Multiply,
                TokenKind::IntegerLiteral,
                TokenKind::RightParen,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn lines_and_columns_after_newlines() {
        assert_eq!(
            positions("  program\n\tvar \n begin"),
            vec![
                ("program".into(), 1, 3),
                ("var".into(), 2, 2),
                ("begin".into(), 3, 2),
            ]
        );
    }

    #[test]
    fn end_of_program() {
        let tokens = Lexer::new("end.").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfProgram);
        assert_eq!(tokens[0].lexeme, "end.");

        assert_eq!(kinds("end ."), vec![TokenKind::End, TokenKind::Unknown]);
    }

    #[test]
    fn mixed_program_positions() {
        let tokens = Lexer::new(
            "program myProgram; var counter: integer; begin Write(\"hello\"); end.",
        )
        .tokenize()
        .unwrap();
        assert_eq!(tokens.len(), 15);
        assert_eq!(tokens[6].kind, TokenKind::IntegerType);
        assert_eq!(tokens[6].loc.col, 33);
        assert_eq!(tokens[11].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[11].loc.col, 54);
        assert_eq!(tokens[14].kind, TokenKind::EndOfProgram);
        assert_eq!(tokens[14].loc.col, 64);
    }

    #[test]
    fn unterminated_string() {
        let err = Lexer::new("x := \"hello").tokenize().unwrap_err();
        assert_eq!(err.error, crate::error::PascalError::Lexical);
        let loc = err.location.unwrap();
        assert_eq!((loc.line, loc.col), (1, 6));
        assert!(err.detail.unwrap().contains("unterminated string"));
    }

    #[test]
    fn unknown_character() {
        let err = Lexer::new("a # b").tokenize().unwrap_err();
        assert!(err.detail.unwrap().contains("'#'"));
        assert_eq!(err.location.unwrap().col, 3);
    }
}
