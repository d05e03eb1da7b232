use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::errors::AuthError;
use crate::domain::user::errors::MailerError;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SignedUpUser;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::SsoAuthorization;
use crate::domain::user::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::VerificationCode;

/// Port for auth domain service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Create a user with a hashed password, a one-time verification code,
    /// and a verify-email token bound to the new account.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn signup(&self, command: SignupCommand) -> Result<SignedUpUser, AuthError>;

    /// Consume a verification code and mark the user's email verified.
    ///
    /// Consumption and the flag flip are a single atomic unit; of two
    /// concurrent attempts only one succeeds, the other observes
    /// `CodeNotFound`.
    ///
    /// # Errors
    /// * `AlreadyVerified` - User already verified their email
    /// * `CodeNotFound` - No such code for this user (or already consumed)
    /// * `CodeExpired` - Code exists but its expiry has passed
    async fn verify_email(&self, user: &User, code: u32) -> Result<User, AuthError>;

    /// Authenticate by email and password, minting an access/refresh pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, unverified account, or wrong
    ///   password; the three are indistinguishable by design
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Authenticate through an existing SSO link.
    ///
    /// # Errors
    /// * `UserNotFound` - No account linked to this provider identity
    async fn login_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<TokenPair, AuthError>;

    /// Create a pre-verified, passwordless account linked to an external
    /// identity and mint a token pair for it.
    ///
    /// # Errors
    /// * `AlreadyLinkedOrExists` - Email or provider link already taken
    ///   (e.g. a racing double-signup)
    async fn signup_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
        email: EmailAddress,
    ) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The presented refresh token stays valid until its own expiry; there
    /// is no rotation.
    ///
    /// # Errors
    /// * `BadToken` - Token undecodable, expired, of the wrong kind or
    ///   scope, or its subject no longer exists
    async fn refresh_token(&self, refresh_token: &str) -> Result<String, AuthError>;

    /// Resolve a bearer token of any kind to its user.
    ///
    /// # Errors
    /// * `BadToken` - Token invalid or subject unresolvable
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn get_by_id(&self, id: UserId) -> Result<User, AuthError>;

    /// Retrieve user by normalized email.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn get_by_email(&self, email: &str) -> Result<User, AuthError>;

    /// List users with an optional active filter and offset pagination.
    async fn fetch(
        &self,
        filter: UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<UserPage, AuthError>;

    /// Delete a user; dependent rows cascade.
    ///
    /// # Errors
    /// * `UserNotFound` - Deleting a nonexistent id is an error, not a no-op
    async fn delete(&self, id: UserId) -> Result<(), AuthError>;
}

/// Persistence operations for the user aggregate and its dependents.
///
/// The single writer of durable state. Uniqueness constraints
/// (`email`, `(user_id, code)`, `(user_id, provider_name)`) are the
/// concurrency guard; this boundary translates their violations into
/// domain errors.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new local user.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email uniqueness violated
    async fn create(&self, email: &EmailAddress, password_hash: &str) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AuthError>;

    /// Lookup by already-normalized (lowercase) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn fetch(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, AuthError>;

    /// # Errors
    /// * `UserNotFound` - No row deleted
    async fn delete(&self, id: UserId) -> Result<(), AuthError>;

    /// Store a fresh verification code, superseding any earlier unconsumed
    /// codes of the same user in the same transaction.
    async fn create_verification_code(
        &self,
        user_id: UserId,
        code: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode, AuthError>;

    async fn find_verification_code(
        &self,
        user_id: UserId,
        code: u32,
    ) -> Result<Option<VerificationCode>, AuthError>;

    /// Atomically delete the code row and set the user's verified flag.
    ///
    /// The delete determines the winner under concurrency.
    ///
    /// # Errors
    /// * `CodeNotFound` - Code was already consumed
    async fn consume_verification_code(
        &self,
        code: &VerificationCode,
    ) -> Result<User, AuthError>;

    /// Create a pre-verified user plus its provider link in one transaction.
    ///
    /// # Errors
    /// * `AlreadyLinkedOrExists` - Email or `(user_id, provider_name)`
    ///   uniqueness violated
    async fn create_sso_user(
        &self,
        provider_name: &str,
        provider_id: &str,
        email: &EmailAddress,
    ) -> Result<(User, SsoAuthorization), AuthError>;

    async fn find_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError>;
}

/// Outbound notification port.
///
/// Dispatch is fire-and-forget relative to the HTTP response; failures are
/// logged by the caller, never retried by the domain.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_verification_code(
        &self,
        recipient: &str,
        code: u32,
    ) -> Result<(), MailerError>;
}
