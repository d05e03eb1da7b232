use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::user::errors::AuthError;
use crate::domain::user::models::User;

pub mod delete_user;
pub mod get_profile;
pub mod get_user;
pub mod list_users;
pub mod login;
pub mod refresh_token;
pub mod signup;
pub mod sso_login;
pub mod verify_email;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) | AuthError::InvalidPassword(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            AuthError::EmailAlreadyExists(_) | AuthError::AlreadyLinkedOrExists => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::InvalidCredentials | AuthError::BadToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::AlreadyVerified | AuthError::CodeNotFound | AuthError::CodeExpired => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::PermissionDenied => ApiError::Forbidden(err.to_string()),
            AuthError::DatabaseError(_) | AuthError::Unknown(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// User representation exposed over the API.
///
/// The `id` field carries the opaque encoding, never the raw integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub is_email_verified: bool,
}

impl UserData {
    pub fn new(user: &User, codec: &auth::IdCodec) -> Self {
        Self {
            id: codec.encode(user.id.as_u64()),
            email: user.email.as_str().to_string(),
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
        }
    }
}

/// Gate a protected handler on token purpose and scope.
///
/// Purpose and scope failures answer identically so a probing client
/// learns nothing about which check tripped.
pub fn require_token(
    claims: &auth::Claims,
    kind: auth::TokenKind,
    scope: auth::Scope,
) -> Result<(), ApiError> {
    if claims.kind != kind || claims.require_scope(scope).is_err() {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }
    Ok(())
}
