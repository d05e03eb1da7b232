use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;

/// User aggregate entity.
///
/// The raw numeric identifier never leaves the service; external callers
/// only ever see its opaque encoding.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    /// PHC-format digest; empty for SSO-only accounts.
    pub password_hash: String,
    pub is_active: bool,
    pub is_email_verified: bool,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl UserId {
    /// Numeric value for opaque encoding at the API boundary.
    pub fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser and normalizes to
/// lowercase, so uniqueness and lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, lowercased email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted from a signup request.
///
/// Only enforces the signup policy; hashing happens in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;

    /// Create a policy-checked password.
    ///
    /// # Errors
    /// * `TooShort` - Password shorter than 8 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One-time email-proof token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub id: i64,
    pub user_id: UserId,
    /// 6-digit value in `[100000, 999999]`.
    pub code: u32,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    /// An expired, unconsumed code is simply unusable.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Link between a local user and an external identity-provider account.
///
/// One per provider per user; created only during SSO signup and never
/// independently mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoAuthorization {
    pub id: i64,
    pub user_id: UserId,
    pub provider_name: String,
    pub provider_id: String,
}

/// Command to sign up a new user with validated fields.
#[derive(Debug)]
pub struct SignupCommand {
    pub email: EmailAddress,
    pub password: Password,
}

impl SignupCommand {
    pub fn new(email: EmailAddress, password: Password) -> Self {
        Self { email, password }
    }
}

/// Result of a successful signup.
#[derive(Debug, Clone)]
pub struct SignedUpUser {
    pub user: User,
    pub code: VerificationCode,
    /// Verify-email token the client presents to the verification endpoint.
    pub token: String,
}

/// Tokens minted for an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Filter for user listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub is_active: Option<bool>,
}

/// One page of a user listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub count: usize,
    pub items: Vec<User>,
}

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: auth::Claims,
}
