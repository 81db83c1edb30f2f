//! Pascal-- abstract syntax tree.
//!
//! A program is a sequence of blocks: the header block, an optional const
//! block, an optional var block and the begin block. Each block opens with a
//! marker node so the interpreter can tell the sections apart. Expressions
//! are not parsed into sub-trees; statements keep the raw token run and the
//! expression pipeline evaluates it at execution time.

use std::fmt;

use crate::error::SourceLoc;
use crate::lexer::Token;
use crate::value::Value;

/// A complete parsed program.
#[derive(Debug, Clone)]
pub struct Program {
    pub blocks: Vec<Block>,
}

impl Program {
    /// Name given in the `program` header, if the header block is present.
    pub fn name(&self) -> Option<&str> {
        self.blocks.first()?.iter().find_map(|node| match &node.kind {
            NodeKind::ProgramHeader { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// An ordered run of nodes: one top-level section, or a `then`/`else` branch.
pub type Block = Vec<Node>;

/// A single node with the location of its first token.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: SourceLoc,
}

impl Node {
    pub fn new(kind: NodeKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// `program name;`
    ProgramHeader { name: String },

    /// Section markers opening the const, var and begin blocks.
    ConstSection,
    VarSection,
    BeginSection,

    /// `name : type = literal;`
    ConstDeclaration {
        identifier: String,
        declared_type: DeclaredType,
        value: Value,
    },

    /// `a, b, c : type;`
    VariableDeclaration {
        identifiers: IdentifierList,
        declared_type: DeclaredType,
    },

    /// `target := expression;`
    Assignment { target: String, expr: Vec<Token> },

    /// `Write(args);`. The argument run keeps its commas.
    Write { args: Vec<Token> },

    /// `Read(a, b);`
    Read { identifiers: IdentifierList },

    /// `if (condition) then block [else block]`
    If {
        condition: Vec<Token>,
        then_block: Block,
        else_block: Option<Block>,
    },
}

impl NodeKind {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProgramHeader { .. } => "program header",
            Self::ConstSection => "const section",
            Self::VarSection => "var section",
            Self::BeginSection => "begin section",
            Self::ConstDeclaration { .. } => "const declaration",
            Self::VariableDeclaration { .. } => "variable declaration",
            Self::Assignment { .. } => "assignment",
            Self::Write { .. } => "Write",
            Self::Read { .. } => "Read",
            Self::If { .. } => "if",
        }
    }
}

/// Ordered list of names from a declaration or a `Read` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierList {
    pub names: Vec<String>,
}

impl IdentifierList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl<'a> IntoIterator for &'a IdentifierList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Type named in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Integer,
    Double,
    String,
}

impl DeclaredType {
    /// Initial value of a freshly declared variable.
    pub fn zero_value(self) -> Value {
        match self {
            Self::Integer => Value::Int(0),
            Self::Double => Value::Double(0.0),
            Self::String => Value::Str(String::new()),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
        })
    }
}
