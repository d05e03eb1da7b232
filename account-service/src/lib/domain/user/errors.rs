use thiserror::Error;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password policy violations at signup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },
}

/// Error for outbound mail dispatch
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to send mail: {0}")]
    SendFailed(String),
}

/// Top-level error for all auth and user operations.
///
/// The repository is the only layer that translates storage conditions
/// ("no row", "constraint violated") into these variants; handlers map them
/// onto transport status codes and never see storage error types.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    // Domain-level errors
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Account already exists or is linked to this provider")]
    AlreadyLinkedOrExists,

    /// Deliberately covers unknown email, unverified account, and password
    /// mismatch alike, so response content distinguishes none of them.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Verification code not found")]
    CodeNotFound,

    #[error("Verification code is expired")]
    CodeExpired,

    /// Uniform for undecodable, expired, wrong-kind, wrong-scope, and
    /// no-such-subject tokens.
    #[error("Invalid token")]
    BadToken,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
