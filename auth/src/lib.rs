//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for the account service:
//! - Password hashing (Argon2id)
//! - Token issuance and validation (signed, scoped, expiring JWTs)
//! - Opaque-id obfuscation of numeric identifiers (hashids)
//! - One-time verification code generation
//!
//! The service defines its own domain ports and adapts these
//! implementations; nothing in here touches storage or the network.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("password", "not a digest"));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{Scope, TokenKind, TokenService};
//! use chrono::Duration;
//!
//! let tokens = TokenService::new(b"secret_key_at_least_32_bytes_long!");
//! let token = tokens
//!     .issue("subject", TokenKind::Access, Duration::minutes(5), &[Scope::ProfileRead])
//!     .unwrap();
//! let claims = tokens.verify(&token, TokenKind::Access).unwrap();
//! claims.require_scope(Scope::ProfileRead).unwrap();
//! ```
//!
//! ## Opaque ids
//! ```
//! use auth::IdCodec;
//!
//! let codec = IdCodec::new("secret_salt", 8).unwrap();
//! let opaque = codec.encode(42);
//! assert_eq!(codec.decode(&opaque).unwrap(), 42);
//! ```

pub mod hashid;
pub mod jwt;
pub mod password;
pub mod verification;

// Re-export commonly used items
pub use hashid::HashidError;
pub use hashid::IdCodec;
pub use jwt::Claims;
pub use jwt::Scope;
pub use jwt::TokenError;
pub use jwt::TokenKind;
pub use jwt::TokenService;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use verification::generate_code;
