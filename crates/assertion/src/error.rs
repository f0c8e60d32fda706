//! Error types for assertion parsing.

use idassert_core::CoreError;
use thiserror::Error;

/// What went wrong while parsing an assertion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input holds no expression at all.
    #[error("empty assertion")]
    EmptyExpression,

    /// A character outside the assertion alphabet.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    /// A well-formed token in a place the grammar does not allow.
    #[error("unexpected token")]
    UnexpectedToken,

    /// `)` without a matching `(`.
    #[error("unmatched ')'")]
    UnmatchedParen,

    /// `(` never closed.
    #[error("unclosed '('")]
    UnclosedParen,

    /// Parentheses nested deeper than the parser allows.
    #[error("parentheses nested too deeply")]
    NestingTooDeep,

    /// `()`.
    #[error("empty group")]
    EmptyGroup,

    /// An operator with no operand on one side.
    #[error("operator is missing an operand")]
    DanglingOperator,

    /// An escaped `(name)` that is never closed or holds illegal characters.
    #[error("unterminated escaped name")]
    UnterminatedName,

    /// A token that is not `name@service`, `service:name` or a bare name.
    #[error("Invalid key-value identity: {0}")]
    InvalidIdentity(String),

    /// Bare name in strict mode.
    #[error("Bad assertion, no 'type' given: {0}")]
    MissingService(String),

    /// OR operator in AND-only mode.
    #[error("OR is not allowed in this assertion")]
    OrNotAllowed,

    /// The value failed its service's check.
    #[error("{0}")]
    InvalidValue(CoreError),
}

/// A parse failure and the byte offset it was detected at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} (at position {position})")]
pub struct ParseError {
    /// Byte offset into the input.
    pub position: usize,
    /// Failure class.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

/// Result type alias for ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;
