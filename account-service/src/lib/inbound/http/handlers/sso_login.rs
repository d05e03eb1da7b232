use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::login::TokenPairData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::errors::AuthError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Login through an external identity already validated by the provider,
/// creating the account on first contact.
pub async fn sso_login(
    State(state): State<AppState>,
    Json(body): Json<SsoLoginRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let pair = match state
        .auth_service
        .login_by_sso(&body.provider, &body.provider_id)
        .await
    {
        Ok(pair) => pair,
        Err(AuthError::UserNotFound(_)) => {
            let email = EmailAddress::new(body.email)
                .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;
            state
                .auth_service
                .signup_by_sso(&body.provider, &body.provider_id, email)
                .await
                .map_err(ApiError::from)?
        }
        Err(e) => return Err(ApiError::from(e)),
    };

    Ok(ApiSuccess::new(StatusCode::OK, (&pair).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SsoLoginRequest {
    provider: String,
    provider_id: String,
    email: String,
}
