use std::sync::Arc;

use async_trait::async_trait;
use auth::IdCodec;
use auth::Scope;
use auth::TokenKind;
use auth::TokenService;
use chrono::Duration;
use chrono::Utc;

use crate::domain::user::errors::AuthError;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SignedUpUser;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPage;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::user::ports::UserRepository;

/// Validity windows for each token kind, fixed at startup from config.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
    pub verify_email: Duration,
}

/// Auth domain orchestrator.
///
/// Stateless between calls: every operation acquires what it needs through
/// the repository port and releases it on exit. Token issuance and password
/// hashing are pure computation and safe for unlimited parallel use.
pub struct AuthService<R>
where
    R: UserRepository,
{
    repository: Arc<R>,
    password_hasher: auth::PasswordHasher,
    tokens: TokenService,
    id_codec: Arc<IdCodec>,
    ttls: TokenTtls,
}

impl<R> AuthService<R>
where
    R: UserRepository,
{
    /// Create a new auth service with injected dependencies.
    pub fn new(
        repository: Arc<R>,
        tokens: TokenService,
        id_codec: Arc<IdCodec>,
        ttls: TokenTtls,
    ) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
            tokens,
            id_codec,
            ttls,
        }
    }

    fn subject(&self, id: UserId) -> String {
        self.id_codec.encode(id.as_u64())
    }

    fn decode_subject(&self, subject: &str) -> Result<UserId, AuthError> {
        let raw = self.id_codec.decode(subject).map_err(|_| AuthError::BadToken)?;
        i64::try_from(raw).map(UserId).map_err(|_| AuthError::BadToken)
    }

    fn issue(
        &self,
        user_id: UserId,
        kind: TokenKind,
        ttl: Duration,
        scopes: &[Scope],
    ) -> Result<String, AuthError> {
        self.tokens
            .issue(&self.subject(user_id), kind, ttl, scopes)
            .map_err(|e| AuthError::Unknown(format!("Token issuance failed: {}", e)))
    }

    fn token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token =
            self.issue(user.id, TokenKind::Access, self.ttls.access, &Scope::basic())?;

        // The refresh token records the session's permission scopes so a
        // refreshed access token re-grants them.
        let mut refresh_scopes = Scope::basic();
        refresh_scopes.push(Scope::TokenRefresh);
        let refresh_token = self.issue(
            user.id,
            TokenKind::Refresh,
            self.ttls.refresh,
            &refresh_scopes,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[async_trait]
impl<R> AuthServicePort for AuthService<R>
where
    R: UserRepository,
{
    async fn signup(&self, command: SignupCommand) -> Result<SignedUpUser, AuthError> {
        let password_hash = self
            .password_hasher
            .hash(command.password.as_str())
            .map_err(|e| AuthError::Unknown(format!("Password hashing failed: {}", e)))?;

        let user = self.repository.create(&command.email, &password_hash).await?;

        let code = self
            .repository
            .create_verification_code(
                user.id,
                auth::generate_code(),
                Utc::now() + self.ttls.verify_email,
            )
            .await?;

        let token = self.issue(
            user.id,
            TokenKind::VerifyEmail,
            self.ttls.verify_email,
            &[Scope::ProfileVerify],
        )?;

        Ok(SignedUpUser { user, code, token })
    }

    async fn verify_email(&self, user: &User, code: u32) -> Result<User, AuthError> {
        if user.is_email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = self
            .repository
            .find_verification_code(user.id, code)
            .await?
            .ok_or(AuthError::CodeNotFound)?;

        if code.is_expired(Utc::now()) {
            return Err(AuthError::CodeExpired);
        }

        // The repository deletes the row and flips the flag in one
        // transaction; a concurrent consumer loses with CodeNotFound.
        self.repository.consume_verification_code(&code).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = email.trim().to_lowercase();
        let user = self.repository.find_by_email(&email).await?;

        // Unknown email, unverified account, and wrong password (including
        // the empty digest of SSO-only accounts) all fail identically.
        let user = match user {
            Some(user)
                if user.is_email_verified
                    && self.password_hasher.verify(password, &user.password_hash) =>
            {
                user
            }
            _ => return Err(AuthError::InvalidCredentials),
        };

        self.token_pair(&user)
    }

    async fn login_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .repository
            .find_by_sso(provider_name, provider_id)
            .await?
            .ok_or_else(|| {
                AuthError::UserNotFound(format!("{}:{}", provider_name, provider_id))
            })?;

        self.token_pair(&user)
    }

    async fn signup_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
        email: EmailAddress,
    ) -> Result<TokenPair, AuthError> {
        let (user, _) = self
            .repository
            .create_sso_user(provider_name, provider_id, &email)
            .await?;

        self.token_pair(&user)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::BadToken)?;
        claims
            .require_scope(Scope::TokenRefresh)
            .map_err(|_| AuthError::BadToken)?;

        let user_id = self.decode_subject(&claims.sub)?;
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::BadToken)?;

        // Re-grant the session's permission scopes; single-purpose scopes
        // never transfer onto an access token.
        let scopes: Vec<Scope> = claims
            .scopes
            .iter()
            .copied()
            .filter(|scope| !scope.is_private())
            .collect();

        self.issue(user.id, TokenKind::Access, self.ttls.access, &scopes)
    }

    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.tokens.read(token).map_err(|_| AuthError::BadToken)?;
        let user_id = self.decode_subject(&claims.sub)?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::BadToken)?;

        Ok(AuthenticatedUser { user, claims })
    }

    async fn get_by_id(&self, id: UserId) -> Result<User, AuthError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound(id.to_string()))
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        self.repository
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound(email))
    }

    async fn fetch(
        &self,
        filter: UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<UserPage, AuthError> {
        let items = self.repository.fetch(&filter, offset, limit).await?;
        Ok(UserPage {
            count: items.len(),
            items,
        })
    }

    async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        self.repository.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::user::models::SsoAuthorization;
    use crate::domain::user::models::Password;
    use crate::domain::user::models::VerificationCode;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, email: &EmailAddress, password_hash: &str) -> Result<User, AuthError>;
            async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AuthError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
            async fn fetch(&self, filter: &UserFilter, offset: i64, limit: i64) -> Result<Vec<User>, AuthError>;
            async fn delete(&self, id: UserId) -> Result<(), AuthError>;
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
            async fn consume_verification_code(&self, code: &VerificationCode) -> Result<User, AuthError>;
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
    }

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn test_ttls() -> TokenTtls {
        TokenTtls {
            access: Duration::minutes(60),
            refresh: Duration::days(30),
            verify_email: Duration::minutes(15),
        }
    }

    fn test_codec() -> Arc<IdCodec> {
        Arc::new(IdCodec::new("test_salt", 8).unwrap())
    }

    fn service(repository: MockTestUserRepository) -> AuthService<MockTestUserRepository> {
        AuthService::new(
            Arc::new(repository),
            TokenService::new(SECRET),
            test_codec(),
            test_ttls(),
        )
    }

    fn make_user(id: i64, email: &str, password_hash: &str, verified: bool) -> User {
        User {
            id: UserId(id),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_email_verified: verified,
        }
    }

    fn signup_command(email: &str, password: &str) -> SignupCommand {
        SignupCommand::new(
            EmailAddress::new(email.to_string()).unwrap(),
            Password::new(password.to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_signup_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_create()
            .withf(|email, hash| {
                email.as_str() == "test@example.com" && hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|email, hash| {
                Ok(User {
                    id: UserId(7),
                    email: email.clone(),
                    password_hash: hash.to_string(),
                    is_active: true,
                    is_email_verified: false,
                })
            });

        repository
            .expect_create_verification_code()
            .withf(|user_id, code, expires_at| {
                *user_id == UserId(7)
                    && (100_000..=999_999).contains(code)
                    && *expires_at > Utc::now()
            })
            .times(1)
            .returning(|user_id, code, expires_at| {
                Ok(VerificationCode {
                    id: 1,
                    user_id,
                    code,
                    expires_at,
                })
            });

        let service = service(repository);
        let signed_up = service
            .signup(signup_command("Test@Example.com", "password123"))
            .await
            .unwrap();

        assert_eq!(signed_up.user.email.as_str(), "test@example.com");
        assert!(!signed_up.user.is_email_verified);

        // The signup token is verify-email kind, scoped for verification
        // only, and bound to the created user.
        let tokens = TokenService::new(SECRET);
        let claims = tokens
            .verify(&signed_up.token, TokenKind::VerifyEmail)
            .unwrap();
        assert!(claims.require_scope(Scope::ProfileVerify).is_ok());
        assert_eq!(test_codec().decode(&claims.sub), Ok(7));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_create()
            .times(1)
            .returning(|email, _| Err(AuthError::EmailAlreadyExists(email.as_str().to_string())));
        repository.expect_create_verification_code().times(0);

        let service = service(repository);
        let result = service
            .signup(signup_command("taken@example.com", "password123"))
            .await;

        assert!(matches!(result, Err(AuthError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_verify_email_success() {
        let mut repository = MockTestUserRepository::new();
        let user = make_user(7, "test@example.com", "$argon2id$hash", false);

        let stored = VerificationCode {
            id: 1,
            user_id: UserId(7),
            code: 123_456,
            expires_at: Utc::now() + Duration::minutes(5),
        };
        let found = stored.clone();
        repository
            .expect_find_verification_code()
            .with(eq(UserId(7)), eq(123_456u32))
            .times(1)
            .returning(move |_, _| Ok(Some(found.clone())));
        repository
            .expect_consume_verification_code()
            .withf(move |code| *code == stored)
            .times(1)
            .returning(|code| {
                Ok(User {
                    id: code.user_id,
                    email: EmailAddress::new("test@example.com".to_string()).unwrap(),
                    password_hash: "$argon2id$hash".to_string(),
                    is_active: true,
                    is_email_verified: true,
                })
            });

        let service = service(repository);
        let verified = service.verify_email(&user, 123_456).await.unwrap();
        assert!(verified.is_email_verified);
    }

    #[tokio::test]
    async fn test_verify_email_already_verified() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_verification_code().times(0);
        repository.expect_consume_verification_code().times(0);

        let user = make_user(7, "test@example.com", "$argon2id$hash", true);
        let service = service(repository);

        let result = service.verify_email(&user, 123_456).await;
        assert!(matches!(result, Err(AuthError::AlreadyVerified)));
    }

    #[tokio::test]
    async fn test_verify_email_code_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_verification_code()
            .times(1)
            .returning(|_, _| Ok(None));
        repository.expect_consume_verification_code().times(0);

        let user = make_user(7, "test@example.com", "$argon2id$hash", false);
        let service = service(repository);

        let result = service.verify_email(&user, 654_321).await;
        assert!(matches!(result, Err(AuthError::CodeNotFound)));
    }

    #[tokio::test]
    async fn test_verify_email_code_expired() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_verification_code()
            .times(1)
            .returning(|user_id, code| {
                Ok(Some(VerificationCode {
                    id: 1,
                    user_id,
                    code,
                    expires_at: Utc::now() - Duration::seconds(1),
                }))
            });
        repository.expect_consume_verification_code().times(0);

        let user = make_user(7, "test@example.com", "$argon2id$hash", false);
        let service = service(repository);

        let result = service.verify_email(&user, 123_456).await;
        assert!(matches!(result, Err(AuthError::CodeExpired)));
    }

    #[tokio::test]
    async fn test_verify_email_lost_race() {
        // Both readers saw the code; only the first consumer wins.
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_verification_code()
            .times(1)
            .returning(|user_id, code| {
                Ok(Some(VerificationCode {
                    id: 1,
                    user_id,
                    code,
                    expires_at: Utc::now() + Duration::minutes(5),
                }))
            });
        repository
            .expect_consume_verification_code()
            .times(1)
            .returning(|_| Err(AuthError::CodeNotFound));

        let user = make_user(7, "test@example.com", "$argon2id$hash", false);
        let service = service(repository);

        let result = service.verify_email(&user, 123_456).await;
        assert!(matches!(result, Err(AuthError::CodeNotFound)));
    }

    #[tokio::test]
    async fn test_login_success() {
        let hash = auth::PasswordHasher::new().hash("password123").unwrap();
        let user = make_user(7, "test@example.com", &hash, true);

        let mut repository = MockTestUserRepository::new();
        let found = user.clone();
        // The lookup must receive the normalized form of what the caller typed.
        repository
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let service = service(repository);
        let pair = service
            .login(" Test@Example.com ", "password123")
            .await
            .unwrap();

        let tokens = TokenService::new(SECRET);
        let access = tokens.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert!(access.require_scope(Scope::ProfileRead).is_ok());
        assert!(access.require_scope(Scope::ProfileEdit).is_ok());
        assert_eq!(test_codec().decode(&access.sub), Ok(7));

        let refresh = tokens
            .verify(&pair.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert!(refresh.require_scope(Scope::TokenRefresh).is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository);
        let result = service.login("nobody@example.com", "password123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unverified_user() {
        let hash = auth::PasswordHasher::new().hash("password123").unwrap();
        let user = make_user(7, "test@example.com", &hash, false);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository);
        // Correct password, but the account never verified its email.
        let result = service.login("test@example.com", "password123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let hash = auth::PasswordHasher::new().hash("password123").unwrap();
        let user = make_user(7, "test@example.com", &hash, true);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository);
        let result = service.login("test@example.com", "wrong_password").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_sso_only_account() {
        // SSO accounts carry an empty digest; the password path fails for
        // them exactly like a wrong password.
        let user = make_user(7, "sso@example.com", "", true);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository);
        let result = service.login("sso@example.com", "any_password").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_by_sso_found() {
        let user = make_user(9, "sso@example.com", "", true);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_sso()
            .with(eq("google"), eq("provider-sub-1"))
            .times(1)
            .returning(move |_, _| Ok(Some(user.clone())));

        let service = service(repository);
        let pair = service.login_by_sso("google", "provider-sub-1").await.unwrap();

        let claims = TokenService::new(SECRET)
            .verify(&pair.access_token, TokenKind::Access)
            .unwrap();
        assert_eq!(test_codec().decode(&claims.sub), Ok(9));
    }

    #[tokio::test]
    async fn test_login_by_sso_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_sso()
            .times(1)
            .returning(|_, _| Ok(None));

        let service = service(repository);
        let result = service.login_by_sso("google", "provider-sub-1").await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_signup_by_sso_success() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_create_sso_user()
            .withf(|provider, provider_id, email| {
                provider == "google"
                    && provider_id == "provider-sub-1"
                    && email.as_str() == "sso@example.com"
            })
            .times(1)
            .returning(|provider, provider_id, email| {
                let user = User {
                    id: UserId(11),
                    email: email.clone(),
                    password_hash: String::new(),
                    is_active: true,
                    is_email_verified: true,
                };
                let link = SsoAuthorization {
                    id: 1,
                    user_id: user.id,
                    provider_name: provider.to_string(),
                    provider_id: provider_id.to_string(),
                };
                Ok((user, link))
            });

        let service = service(repository);
        let email = EmailAddress::new("SSO@Example.com".to_string()).unwrap();
        let pair = service
            .signup_by_sso("google", "provider-sub-1", email)
            .await
            .unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_signup_by_sso_conflict() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_create_sso_user()
            .times(1)
            .returning(|_, _, _| Err(AuthError::AlreadyLinkedOrExists));

        let service = service(repository);
        let email = EmailAddress::new("sso@example.com".to_string()).unwrap();
        let result = service.signup_by_sso("google", "provider-sub-1", email).await;

        assert!(matches!(result, Err(AuthError::AlreadyLinkedOrExists)));
    }

    #[tokio::test]
    async fn test_refresh_token_success() {
        let user = make_user(7, "test@example.com", "$argon2id$hash", true);

        let mut repository = MockTestUserRepository::new();
        let found = user.clone();
        repository
            .expect_find_by_id()
            .with(eq(UserId(7)))
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let service = service(repository);
        let refresh_token = TokenService::new(SECRET)
            .issue(
                &test_codec().encode(7),
                TokenKind::Refresh,
                Duration::days(30),
                &[Scope::ProfileRead, Scope::ProfileEdit, Scope::TokenRefresh],
            )
            .unwrap();

        let access_token = service.refresh_token(&refresh_token).await.unwrap();

        let claims = TokenService::new(SECRET)
            .verify(&access_token, TokenKind::Access)
            .unwrap();
        assert!(claims.require_scope(Scope::ProfileRead).is_ok());
        // Single-purpose scopes never transfer onto access tokens.
        assert!(!claims.has_scope(Scope::TokenRefresh));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let service = service(repository);
        let access_token = TokenService::new(SECRET)
            .issue(
                &test_codec().encode(7),
                TokenKind::Access,
                Duration::minutes(60),
                &[Scope::TokenRefresh],
            )
            .unwrap();

        let result = service.refresh_token(&access_token).await;
        assert!(matches!(result, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_missing_scope() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let service = service(repository);
        let refresh_token = TokenService::new(SECRET)
            .issue(
                &test_codec().encode(7),
                TokenKind::Refresh,
                Duration::days(30),
                &[Scope::ProfileRead],
            )
            .unwrap();

        let result = service.refresh_token(&refresh_token).await;
        assert!(matches!(result, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage() {
        let repository = MockTestUserRepository::new();
        let service = service(repository);

        let result = service.refresh_token("garbage.token.here").await;
        assert!(matches!(result, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_deleted_user() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository);
        let refresh_token = TokenService::new(SECRET)
            .issue(
                &test_codec().encode(7),
                TokenKind::Refresh,
                Duration::days(30),
                &[Scope::TokenRefresh],
            )
            .unwrap();

        let result = service.refresh_token(&refresh_token).await;
        assert!(matches!(result, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let user = make_user(7, "test@example.com", "$argon2id$hash", true);

        let mut repository = MockTestUserRepository::new();
        let found = user.clone();
        repository
            .expect_find_by_id()
            .with(eq(UserId(7)))
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let service = service(repository);
        let token = TokenService::new(SECRET)
            .issue(
                &test_codec().encode(7),
                TokenKind::Access,
                Duration::minutes(60),
                &Scope::basic(),
            )
            .unwrap();

        let authenticated = service.authenticate(&token).await.unwrap();
        assert_eq!(authenticated.user.id, UserId(7));
        assert_eq!(authenticated.claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_authenticate_bad_token() {
        let repository = MockTestUserRepository::new();
        let service = service(repository);

        let result = service.authenticate("garbage.token.here").await;
        assert!(matches!(result, Err(AuthError::BadToken)));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(repository);
        let result = service.get_by_id(UserId(404)).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_by_email_normalizes() {
        let user = make_user(7, "test@example.com", "$argon2id$hash", true);

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(repository);
        let found = service.get_by_email(" Test@Example.COM ").await.unwrap();
        assert_eq!(found.id, UserId(7));
    }

    #[tokio::test]
    async fn test_fetch_counts_items() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_fetch()
            .withf(|filter, offset, limit| {
                filter.is_active == Some(true) && *offset == 0 && *limit == 30
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    make_user(1, "a@example.com", "$argon2id$hash", true),
                    make_user(2, "b@example.com", "$argon2id$hash", true),
                ])
            });

        let service = service(repository);
        let page = service
            .fetch(
                UserFilter {
                    is_active: Some(true),
                },
                0,
                30,
            )
            .await
            .unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_delete()
            .times(1)
            .returning(|id| Err(AuthError::UserNotFound(id.to_string())));

        let service = service(repository);
        let result = service.delete(UserId(404)).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }
}
