//! Pascal-- error types and diagnostic formatting.
//!
//! Every failure that escapes a phase is a `Diagnostic`: an error category,
//! an optional source location and an optional detail message. The lexer,
//! parser and interpreter each produce their own category; the expression
//! pipeline reports through `ExprError` (see `expr`) which converts into a
//! diagnostic at the boundary.

use std::fmt;

/// Source location for error reporting. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
    /// Original source line text for display.
    pub source_line: Option<String>,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            source_line: None,
        }
    }

    pub fn with_source(mut self, text: String) -> Self {
        self.source_line = Some(text);
        self
    }
}

/// Error categories, one per failing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PascalError {
    /// Malformed input at the character level.
    Lexical,
    /// Token stream does not match the grammar.
    Syntax,
    /// An expression failed validation (bad token, unbalanced parentheses).
    Expression,
    /// An expression failed during evaluation.
    Evaluation,
    /// Semantic violation while running the program.
    Runtime,
}

impl PascalError {
    pub fn message(self) -> &'static str {
        match self {
            Self::Lexical => "Lexical error",
            Self::Syntax => "Syntax error",
            Self::Expression => "Expression error",
            Self::Evaluation => "Evaluation error",
            Self::Runtime => "Runtime error",
        }
    }
}

/// A lexer/parser/runtime error with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub error: PascalError,
    pub location: Option<SourceLoc>,
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(error: PascalError) -> Self {
        Self {
            error,
            location: None,
            detail: None,
        }
    }

    pub fn lexical(detail: impl Into<String>) -> Self {
        Self::new(PascalError::Lexical).with_detail(detail)
    }

    pub fn syntax(detail: impl Into<String>) -> Self {
        Self::new(PascalError::Syntax).with_detail(detail)
    }

    pub fn runtime(detail: impl Into<String>) -> Self {
        Self::new(PascalError::Runtime).with_detail(detail)
    }

    pub fn at(mut self, loc: SourceLoc) -> Self {
        self.location = Some(loc);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The detail text, or the category message when there is none.
    pub fn reason(&self) -> &str {
        self.detail.as_deref().unwrap_or(self.error.message())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error.message())?;

        if let Some(ref detail) = self.detail {
            write!(f, ": {detail}")?;
        }

        if let Some(ref loc) = self.location {
            write!(f, "\n  at line {}, column {}", loc.line, loc.col)?;
            if let Some(ref source) = loc.source_line {
                write!(f, "\n  | {source}")?;
                write!(f, "\n  | {:>width$}", "^", width = loc.col)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Convenience alias.
pub type PascalResult<T> = Result<T, Diagnostic>;
