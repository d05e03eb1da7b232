use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::ports::AuthServicePort;
use crate::domain::user::ports::Mailer;
use crate::inbound::http::router::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<ApiSuccess<SignupResponseData>, ApiError> {
    let signed_up = state
        .auth_service
        .signup(body.try_into_command()?)
        .await
        .map_err(ApiError::from)?;

    // Email dispatch happens after the response; a delivery failure never
    // fails the signup.
    let mailer = state.mailer.clone();
    let recipient = signed_up.user.email.as_str().to_string();
    let code = signed_up.code.code;
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification_code(&recipient, code).await {
            tracing::error!(to = %recipient, "Failed to send verification code: {}", e);
        }
    });

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        SignupResponseData {
            user: UserData::new(&signed_up.user, &state.id_codec),
            token: signed_up.token,
        },
    ))
}

/// HTTP request body for signing up (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignupRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseSignupRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl SignupRequest {
    fn try_into_command(self) -> Result<SignupCommand, ParseSignupRequestError> {
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        Ok(SignupCommand::new(email, password))
    }
}

impl From<ParseSignupRequestError> for ApiError {
    fn from(err: ParseSignupRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResponseData {
    pub user: UserData,
    /// Verify-email token; the client presents it back with the emailed code.
    pub token: String,
}
