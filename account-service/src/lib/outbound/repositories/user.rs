use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;

use crate::domain::user::errors::AuthError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SsoAuthorization;
use crate::domain::user::models::User;
use crate::domain::user::models::UserFilter;
use crate::domain::user::models::UserId;
use crate::domain::user::models::VerificationCode;
use crate::domain::user::ports::UserRepository;

/// Postgres-backed persistence for the user aggregate.
///
/// Queries are bound at runtime so the crate builds without a live
/// database. Unique constraints do the concurrency arbitration; this layer
/// only translates their violations.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    is_active: bool,
    is_email_verified: bool,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(row.email)?,
            password_hash: row.password,
            is_active: row.is_active,
            is_email_verified: row.is_email_verified,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VerificationCodeRow {
    id: i64,
    // Stored as INTEGER; always within the 6-digit range.
    code: i32,
    user_id: i64,
    expires_at: DateTime<Utc>,
}

impl From<VerificationCodeRow> for VerificationCode {
    fn from(row: VerificationCodeRow) -> Self {
        VerificationCode {
            id: row.id,
            user_id: UserId(row.user_id),
            code: row.code as u32,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SsoAuthorizationRow {
    id: i64,
    provider_name: String,
    provider_id: String,
    user_id: i64,
}

impl From<SsoAuthorizationRow> for SsoAuthorization {
    fn from(row: SsoAuthorizationRow) -> Self {
        SsoAuthorization {
            id: row.id,
            user_id: UserId(row.user_id),
            provider_name: row.provider_name,
            provider_id: row.provider_id,
        }
    }
}

fn violates(e: &sqlx::Error, constraint: &str) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation() && db_err.constraint() == Some(constraint))
        .unwrap_or(false)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, email: &EmailAddress, password_hash: &str) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password, is_active, is_email_verified
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "users_email_key") {
                return AuthError::EmailAlreadyExists(email.as_str().to_string());
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password, is_active, is_email_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password, is_active, is_email_verified
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn fetch(
        &self,
        filter: &UserFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, AuthError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, email, password, is_active, is_email_verified FROM users",
        );

        if let Some(is_active) = filter.is_active {
            query.push(" WHERE is_active = ").push_bind(is_active);
        }

        query.push(" ORDER BY id");
        query.push(" OFFSET ").push_bind(offset);
        query.push(" LIMIT ").push_bind(limit);

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn create_verification_code(
        &self,
        user_id: UserId,
        code: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode, AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        // A newer code supersedes any earlier unconsumed ones.
        sqlx::query(
            r#"
            DELETE FROM verification_codes
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.0)
        .execute(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r#"
            INSERT INTO verification_codes (code, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, code, user_id, expires_at
            "#,
        )
        .bind(code as i32)
        .bind(user_id.0)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    async fn find_verification_code(
        &self,
        user_id: UserId,
        code: u32,
    ) -> Result<Option<VerificationCode>, AuthError> {
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r#"
            SELECT id, code, user_id, expires_at
            FROM verification_codes
            WHERE user_id = $1 AND code = $2
            "#,
        )
        .bind(user_id.0)
        .bind(code as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(row.map(VerificationCode::from))
    }

    async fn consume_verification_code(
        &self,
        code: &VerificationCode,
    ) -> Result<User, AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        // The delete decides the winner between concurrent consumers.
        let deleted = sqlx::query(
            r#"
            DELETE FROM verification_codes
            WHERE id = $1
            "#,
        )
        .bind(code.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if deleted.rows_affected() == 0 {
            return Err(AuthError::CodeNotFound);
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET is_email_verified = TRUE
            WHERE id = $1
            RETURNING id, email, password, is_active, is_email_verified
            "#,
        )
        .bind(code.user_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.try_into()
    }

    async fn create_sso_user(
        &self,
        provider_name: &str,
        provider_id: &str,
        email: &EmailAddress,
    ) -> Result<(User, SsoAuthorization), AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        // The provider already proved ownership of the address, so the
        // account starts verified; the empty password keeps the local
        // login path closed.
        let user_row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password, is_email_verified)
            VALUES ($1, '', TRUE)
            RETURNING id, email, password, is_active, is_email_verified
            "#,
        )
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, "users_email_key") {
                return AuthError::AlreadyLinkedOrExists;
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        let link_row = sqlx::query_as::<_, SsoAuthorizationRow>(
            r#"
            INSERT INTO sso_authorizations (provider_name, provider_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, provider_name, provider_id, user_id
            "#,
        )
        .bind(provider_name)
        .bind(provider_id)
        .bind(user_row.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, "sso_authorizations_user_id_provider_name_key") {
                return AuthError::AlreadyLinkedOrExists;
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok((user_row.try_into()?, link_row.into()))
    }

    async fn find_by_sso(
        &self,
        provider_name: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.password, u.is_active, u.is_email_verified
            FROM users u
            JOIN sso_authorizations s ON s.user_id = u.id
            WHERE s.provider_name = $1 AND s.provider_id = $2
            "#,
        )
        .bind(provider_name)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }
}
