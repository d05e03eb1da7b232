use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::require_token;
use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::middleware::CurrentUser;
use crate::inbound::http::router::AppState;

pub async fn verify_email(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    // Only the token minted at signup can drive verification.
    require_token(
        &current.claims,
        auth::TokenKind::VerifyEmail,
        auth::Scope::ProfileVerify,
    )?;

    state
        .auth_service
        .verify_email(&current.user, body.code)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, UserData::new(user, &state.id_codec)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailRequest {
    code: u32,
}
