//! Error types for query compilation.

use thiserror::Error;

use crate::dsl::SyntaxError;

/// A syntax tree the parser should never have produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Contract violation: {token} on field '{key}' expects a literal value, got {found}")]
    ContractViolation {
        token: &'static str,
        key: String,
        found: &'static str,
    },
}

/// Failure to turn filter text into a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
