//! Shader language compiler
//!
//! Turns a unified `.program` source into a [`CompiledShader`]. Compilation is
//! a pure function of the source text, which is what lets the compilation
//! cache key on source equality alone.

mod ir;
mod lexer;
mod parser;

use std::fmt;

pub use ir::*;
pub use parser::compile;

/// Error raised for malformed shader language source
///
/// Carries the position of the offending construct when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Human-readable description of the problem
    pub message: String,
    /// Where in the source the problem was found
    pub location: Option<SourceLocation>,
}

impl CompileError {
    /// Creates an error without a source position
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Creates an error pointing at `location`
    pub fn at(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}
