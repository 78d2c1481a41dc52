//! Error types for the Quill expression engine.

use thiserror::Error;

use crate::parser::scanner::Position;

/// All errors that can be produced while scanning, parsing or evaluating an
/// expression.
///
/// Every variant carries the [`Position`] of the token or node that failed.
/// Errors raised by host functions that have no source location use
/// [`Position::default`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuillError {
    /// Malformed token or grammar.  Fatal to the current parse.
    #[error("SyntaxError: {message} (line {}, column {})", .pos.line, .pos.column)]
    SyntaxError {
        /// Human-readable description.
        message: String,
        /// Where the offending token starts.
        pos: Position,
    },

    /// An identifier, member or callee could not be resolved.
    #[error("ReferenceError: {message} (line {}, column {})", .pos.line, .pos.column)]
    ReferenceError {
        /// Human-readable description.
        message: String,
        /// Start of the node whose evaluation failed.
        pos: Position,
    },

    /// An operation was applied to a value of the wrong type (calling a
    /// non-function, reading a property of `null`, …).
    #[error("TypeError: {message} (line {}, column {})", .pos.line, .pos.column)]
    TypeError {
        /// Human-readable description.
        message: String,
        /// Start of the node whose evaluation failed.
        pos: Position,
    },

    /// A numeric argument was outside the range the engine accepts (an
    /// invalid array length or index).
    #[error("RangeError: {message} (line {}, column {})", .pos.line, .pos.column)]
    RangeError {
        /// Human-readable description.
        message: String,
        /// Start of the node whose evaluation failed.
        pos: Position,
    },
}

impl QuillError {
    /// Builds a [`QuillError::SyntaxError`].
    pub fn syntax(message: impl Into<String>, pos: Position) -> Self {
        Self::SyntaxError {
            message: message.into(),
            pos,
        }
    }

    /// Builds a [`QuillError::ReferenceError`].
    pub fn reference(message: impl Into<String>, pos: Position) -> Self {
        Self::ReferenceError {
            message: message.into(),
            pos,
        }
    }

    /// Builds a [`QuillError::TypeError`] without a source position.
    ///
    /// Intended for host functions; the evaluator re-anchors positionless
    /// errors to the call site.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
            pos: Position::default(),
        }
    }

    /// Builds a [`QuillError::TypeError`] at `pos`.
    pub fn type_error_at(message: impl Into<String>, pos: Position) -> Self {
        Self::TypeError {
            message: message.into(),
            pos,
        }
    }

    /// Builds a [`QuillError::RangeError`] without a source position.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::RangeError {
            message: message.into(),
            pos: Position::default(),
        }
    }

    /// The message without the error-kind prefix or position.
    pub fn message(&self) -> &str {
        match self {
            Self::SyntaxError { message, .. }
            | Self::ReferenceError { message, .. }
            | Self::TypeError { message, .. }
            | Self::RangeError { message, .. } => message,
        }
    }

    /// The source position the error is anchored to.
    pub fn position(&self) -> Position {
        match self {
            Self::SyntaxError { pos, .. }
            | Self::ReferenceError { pos, .. }
            | Self::TypeError { pos, .. }
            | Self::RangeError { pos, .. } => *pos,
        }
    }

    /// Returns `true` for scan/parse-time errors.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Self::SyntaxError { .. })
    }

    /// Replaces a default (unknown) position with `pos`.
    pub(crate) fn anchored_at(mut self, at: Position) -> Self {
        let slot = match &mut self {
            Self::SyntaxError { pos, .. }
            | Self::ReferenceError { pos, .. }
            | Self::TypeError { pos, .. }
            | Self::RangeError { pos, .. } => pos,
        };
        if *slot == Position::default() {
            *slot = at;
        }
        self
    }
}

/// Convenient `Result` alias for fallible engine operations.
pub type QuillResult<T> = Result<T, QuillError>;
