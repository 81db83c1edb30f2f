//! Pascal-- runtime environment — the constant and variable tables.
//!
//! Names are case-sensitive and live in exactly one of the two tables. The
//! const section always precedes the var section, so only `declare_variable`
//! checks the other table.
//! Lookups consult variables before constants. A variable keeps the tag it
//! was declared with; `assign` refuses a value with a different tag.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::DeclaredType;
use crate::value::Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("Constant already declared: {0}")]
    ConstantRedeclared(String),
    #[error("Redeclared constant name: {0}")]
    ConstantNameReused(String),
    #[error("Variable already declared: {0}")]
    VariableRedeclared(String),
    #[error("Assignment to constant: {0}")]
    AssignToConstant(String),
    #[error("Undeclared variable assignment: {0}")]
    UndeclaredAssignment(String),
    #[error("Cannot store a {found} value in {expected} variable {name}")]
    TagMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    constants: HashMap<String, Value>,
    variables: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_constant(&mut self, name: &str, value: Value) -> Result<(), EnvError> {
        if self.constants.contains_key(name) {
            return Err(EnvError::ConstantRedeclared(name.to_string()));
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Declare a variable holding the zero value of its type.
    pub fn declare_variable(&mut self, name: &str, ty: DeclaredType) -> Result<(), EnvError> {
        if self.constants.contains_key(name) {
            return Err(EnvError::ConstantNameReused(name.to_string()));
        }
        if self.variables.contains_key(name) {
            return Err(EnvError::VariableRedeclared(name.to_string()));
        }
        self.variables.insert(name.to_string(), ty.zero_value());
        Ok(())
    }

    /// Overwrite a variable. The new value must carry the declared tag.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EnvError> {
        if self.constants.contains_key(name) {
            return Err(EnvError::AssignToConstant(name.to_string()));
        }
        let slot = self
            .variables
            .get_mut(name)
            .ok_or_else(|| EnvError::UndeclaredAssignment(name.to_string()))?;
        if !slot.same_tag(&value) {
            return Err(EnvError::TagMismatch {
                name: name.to_string(),
                expected: slot.type_name(),
                found: value.type_name(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Resolve a name, variables first.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).or_else(|| self.constants.get(name))
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }
}
