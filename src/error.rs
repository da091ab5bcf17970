//! Compile error types
//!
//! Every failure in the pipeline is a [`CompileError`]: fatal, reported once,
//! and carrying the source position of the token that caused it. The
//! [`ErrorKind`] tells the caller which stage rejected the program.

use crate::parser::ast::SourceLocation;
use std::fmt;
use thiserror::Error;

/// Result type used throughout the compiler
pub type CompileResult<T> = Result<T, CompileError>;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source text (produced by the lexer only)
    Lexical,
    /// Grammar mismatch: missing punctuation/keyword, unreachable tokens
    Syntax,
    /// Identifier or function not found, or not callable
    Binding,
    /// Assignment to a constant
    Immutability,
    /// Literal/context or operand dataType mismatch, undefined conversion
    Type,
    /// Misplaced local declarations, indexing a non-array, stray break/continue
    Structure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "Lexical",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Binding => "Binding",
            ErrorKind::Immutability => "Immutability",
            ErrorKind::Type => "Type",
            ErrorKind::Structure => "Structure",
        };
        f.write_str(name)
    }
}

/// A fatal compilation error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error at line {}, column {}: {message}", location.line, location.column)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn lexical(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Lexical, message, location)
    }

    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Syntax, message, location)
    }

    pub fn binding(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Binding, message, location)
    }

    pub fn immutability(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Immutability, message, location)
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Type, message, location)
    }

    pub fn structure(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Structure, message, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_position() {
        let err = CompileError::immutability(
            "Cannot assign a value to constant 'x'",
            SourceLocation::new(3, 14),
        );
        assert_eq!(
            err.to_string(),
            "Immutability error at line 3, column 14: Cannot assign a value to constant 'x'"
        );
    }
}
