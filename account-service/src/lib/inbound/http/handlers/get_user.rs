use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    // A string that never came from our encoder is a malformed request,
    // not a missing user.
    let raw = state
        .id_codec
        .decode(&user_id)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let user_id = i64::try_from(raw)
        .map(UserId)
        .map_err(|_| ApiError::BadRequest("Invalid user id".to_string()))?;

    state
        .auth_service
        .get_by_id(user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, UserData::new(user, &state.id_codec)))
}
