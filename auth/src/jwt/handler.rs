use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::Scope;
use super::claims::TokenKind;
use super::errors::TokenError;

/// Service for issuing and validating signed, scoped, expiring tokens.
///
/// One algorithm (HS256) is fixed at construction for the whole deployment;
/// it is never negotiated per token, which rules out algorithm-confusion
/// attacks. There is no revocation list: a compromised token stays valid
/// until its own expiry or until the signing key rotates.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenService {
    /// Create a new token service with a symmetric secret.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a signed token for a subject.
    ///
    /// # Arguments
    /// * `subject` - Opaque-encoded user identifier
    /// * `kind` - Token purpose, recorded in the `kind` claim
    /// * `ttl` - Validity window from now
    /// * `scopes` - Permissions granted to the bearer
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
        scopes: &[Scope],
    ) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);
        let claims = Claims::new(subject, kind, ttl, scopes);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a token.
    ///
    /// Both `sub` and `exp` claims are required; validity is entirely
    /// determined by signature and expiry at read time.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiry
    /// * `InvalidToken` - Signature is invalid, or the token is malformed or
    ///   missing required claims
    pub fn read(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                    _ => TokenError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Decode, validate, and check the token purpose.
    ///
    /// # Errors
    /// * `TokenExpired` / `InvalidToken` - As for [`read`](Self::read)
    /// * `WrongKind` - Token is valid but issued for a different purpose
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.read(token)?;
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_issue_and_read() {
        let service = TokenService::new(SECRET);

        let token = service
            .issue(
                "subject123",
                TokenKind::Access,
                Duration::minutes(10),
                &[Scope::ProfileRead],
            )
            .expect("Failed to issue token");

        let claims = service.read(&token).expect("Failed to read token");
        assert_eq!(claims.sub, "subject123");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.scopes, vec![Scope::ProfileRead]);
    }

    #[test]
    fn test_read_expired_token() {
        let service = TokenService::new(SECRET);

        let token = service
            .issue("subject123", TokenKind::Access, Duration::seconds(-5), &[])
            .expect("Failed to issue token");

        assert_eq!(service.read(&token), Err(TokenError::TokenExpired));
    }

    #[test]
    fn test_read_token_just_before_expiry() {
        let service = TokenService::new(SECRET);

        let token = service
            .issue("subject123", TokenKind::Access, Duration::seconds(5), &[])
            .expect("Failed to issue token");

        assert!(service.read(&token).is_ok());
    }

    #[test]
    fn test_read_malformed_token() {
        let service = TokenService::new(SECRET);

        assert!(matches!(
            service.read("garbage.token.here"),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_read_with_wrong_secret() {
        let issuer = TokenService::new(b"secret1_at_least_32_bytes_long_key!");
        let reader = TokenService::new(b"secret2_at_least_32_bytes_long_key!");

        let token = issuer
            .issue("subject123", TokenKind::Access, Duration::minutes(5), &[])
            .expect("Failed to issue token");

        assert!(matches!(
            reader.read(&token),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_kind() {
        let service = TokenService::new(SECRET);

        let token = service
            .issue(
                "subject123",
                TokenKind::VerifyEmail,
                Duration::minutes(15),
                &[Scope::ProfileVerify],
            )
            .expect("Failed to issue token");

        assert_eq!(
            service.verify(&token, TokenKind::Access),
            Err(TokenError::WrongKind {
                expected: TokenKind::Access,
                actual: TokenKind::VerifyEmail,
            })
        );
        assert!(service.verify(&token, TokenKind::VerifyEmail).is_ok());
    }

    #[test]
    fn test_read_rejects_missing_kind_claim() {
        // A token signed with the right key but without a kind claim is
        // malformed for this deployment.
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::Serialize;

        #[derive(Serialize)]
        struct BareClaims {
            sub: String,
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &BareClaims {
                sub: "subject123".to_string(),
                exp: (chrono::Utc::now() + Duration::minutes(5)).timestamp(),
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let service = TokenService::new(SECRET);
        assert!(matches!(
            service.read(&token),
            Err(TokenError::InvalidToken(_))
        ));
    }
}
