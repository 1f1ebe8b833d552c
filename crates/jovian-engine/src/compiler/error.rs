//! Compilation errors. Every error is fatal: compilation stops and no module
//! is produced.

use crate::parser::ParseError;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Unresolved identifier: {name}")]
    UnresolvedIdentifier { name: String },

    #[error("Unknown class: {name}")]
    UnknownClass { name: String },

    #[error("Malformed `{form}` expression: {reason}")]
    MalformedExpression { form: String, reason: String },

    #[error("Class {class} has no member `{member}`")]
    UnknownMember { class: String, member: String },

    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Duplicate definition of {name}")]
    DuplicateDefinition { name: String },

    #[error("Local variable `{name}` cannot be captured by another function")]
    CapturedLocal { name: String },

    #[error("`{name}` is bound inside a branch or loop body and is not available here")]
    ConditionalBinding { name: String },

    #[error("Generated module is invalid: {}", .errors.join("; "))]
    InvalidModule { errors: Vec<String> },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn malformed(form: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::MalformedExpression {
            form: form.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }
}
