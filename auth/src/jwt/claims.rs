use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::TokenError;

/// Purpose of a token, carried in a dedicated `kind` claim.
///
/// The kind answers "what is this token for" and is validated on every
/// authenticated read. It is deliberately distinct from [`Scope`], which
/// expresses permissions granted to the bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    VerifyEmail,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::VerifyEmail => "verify_email",
        };
        name.fmt(f)
    }
}

/// Named permission grant carried inside a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    ProfileRead,
    ProfileEdit,
    ProfileVerify,
    TokenRefresh,
}

impl Scope {
    /// Scopes granted to a freshly authenticated session.
    pub fn basic() -> Vec<Scope> {
        vec![Scope::ProfileRead, Scope::ProfileEdit]
    }

    /// Scopes never granted through a user-facing flow directly; they are
    /// attached by the service to single-purpose tokens.
    pub fn is_private(&self) -> bool {
        matches!(self, Scope::ProfileVerify | Scope::TokenRefresh)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::ProfileRead => "profile_read",
            Scope::ProfileEdit => "profile_edit",
            Scope::ProfileVerify => "profile_verify",
            Scope::TokenRefresh => "token_refresh",
        };
        name.fmt(f)
    }
}

/// Signed claim set for a service token.
///
/// `sub` carries the opaque-encoded user id, never the raw numeric key.
/// `exp` and `sub` are mandatory; a token missing either is rejected at
/// read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (opaque-encoded user identifier)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token purpose, validated on every read
    pub kind: TokenKind,

    /// Granted permissions
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

impl Claims {
    /// Build claims for a token issued now with the given lifetime.
    pub fn new(subject: impl Into<String>, kind: TokenKind, ttl: Duration, scopes: &[Scope]) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            kind,
            scopes: scopes.to_vec(),
        }
    }

    /// Check whether a scope was granted.
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Require a granted scope, failing with `InsufficientScope`.
    ///
    /// Checked by callers after a successful read; a well-formed token
    /// lacking a scope is a different failure than a bad token.
    pub fn require_scope(&self, scope: Scope) -> Result<(), TokenError> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(TokenError::InsufficientScope(scope))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims_expiry_window() {
        let claims = Claims::new("abc", TokenKind::Access, Duration::minutes(30), &[]);

        assert_eq!(claims.sub, "abc");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_require_scope() {
        let claims = Claims::new(
            "abc",
            TokenKind::Access,
            Duration::minutes(5),
            &[Scope::ProfileRead],
        );

        assert!(claims.require_scope(Scope::ProfileRead).is_ok());
        assert!(matches!(
            claims.require_scope(Scope::ProfileEdit),
            Err(TokenError::InsufficientScope(Scope::ProfileEdit))
        ));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TokenKind::VerifyEmail).unwrap();
        assert_eq!(json, "\"verify_email\"");

        let json = serde_json::to_string(&Scope::TokenRefresh).unwrap();
        assert_eq!(json, "\"token_refresh\"");
    }

    #[test]
    fn test_private_scopes() {
        assert!(Scope::ProfileVerify.is_private());
        assert!(Scope::TokenRefresh.is_private());
        assert!(!Scope::ProfileRead.is_private());
        assert!(!Scope::ProfileEdit.is_private());
    }
}
