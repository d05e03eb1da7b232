use thiserror::Error;

use super::claims::Scope;
use super::claims::TokenKind;

/// Error type for token operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    #[error("Wrong token kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Token lacks required scope: {0}")]
    InsufficientScope(Scope),
}
